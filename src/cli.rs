//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "rp1spi")]
#[command(author, version, about = "Raspberry Pi 5 RP1 SPI master for the Pico command slave", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Host options (e.g., "instance=0,divider=20,mode=1,pins=yes,timeout=1000")
    #[arg(short, long, default_value = "", global = true)]
    pub options: String,

    /// Command to run; without one, read the data block then the clock
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a no-op
    Nop,

    /// Ask the device to reset its counters
    ResetCounters,

    /// Read the device's microsecond clock
    ReadClock,

    /// Read the device's 32-byte data block
    ReadData,

    /// Make the device reboot through its watchdog
    ResetDevice,

    /// Send an arbitrary opcode and read a fixed-size response
    Raw {
        /// Opcode (hex or decimal)
        #[arg(value_parser = parse_hex_u8)]
        opcode: u8,

        /// Response length in frames
        #[arg(default_value_t = 0)]
        len: usize,

        /// Read 32-bit frames instead of bytes
        #[arg(long)]
        words: bool,
    },

    /// Print the SSI register file without touching the configuration
    DumpStatus,
}
