//! rp1spi - SPI master for a Pico command slave on the Raspberry Pi 5
//!
//! Maps the RP1 peripheral window, configures one DW APB SSI instance and
//! exchanges one-byte opcodes with the device:
//!
//! - `read-data` returns the device's 32-byte data block
//! - `read-clock` returns its free-running microsecond counter
//! - `nop`, `reset-counters` and `reset-device` have no response
//!
//! With no subcommand the data block is read first, then the clock.

mod cli;
mod commands;
mod error;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};
use error::HostError;
use rp1spi_core::{Command, CommandTable, RegisterFile, SpiInstance};
use rp1spi_rp1::{parse_options, split_options, Rp1};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), HostError> {
    let opts = parse_options(&split_options(&cli.options)).map_err(HostError::Options)?;
    let rp1 = Rp1::map().map_err(HostError::Map)?;
    let instance = opts.instance;
    let setup_failed = |source: rp1spi_rp1::Rp1Error| HostError::Instance { instance, source };

    if let Some(Commands::DumpStatus) = cli.command {
        let mut regs = rp1.spi(instance).map_err(setup_failed)?;
        commands::print_status(&mut regs, instance);
        return Ok(());
    }

    let mut spi = rp1.open_spi(&opts).map_err(setup_failed)?;
    log::info!(
        "SPI{} at {} Hz, {:?}",
        instance,
        opts.config.clock_hz(),
        opts.config.mode
    );

    let table = CommandTable::default();
    let timeout = opts.timeout;
    match cli.command {
        None => {
            print_data(&mut spi, &table, timeout)?;
            print_clock(&mut spi, &table, timeout)
        }
        Some(Commands::Nop) => commands::send(&mut spi, &table, Command::Nop),
        Some(Commands::ResetCounters) => commands::send(&mut spi, &table, Command::ResetCounters),
        Some(Commands::ResetDevice) => commands::send(&mut spi, &table, Command::ResetDevice),
        Some(Commands::ReadClock) => print_clock(&mut spi, &table, timeout),
        Some(Commands::ReadData) => print_data(&mut spi, &table, timeout),
        Some(Commands::Raw { opcode, len, words }) => {
            if words {
                let mut buf = vec![0u32; len];
                commands::exchange(&mut spi, opcode, &mut buf, timeout)?;
                println!("{}", commands::format_words(&buf));
            } else {
                let mut buf = vec![0u8; len];
                commands::exchange(&mut spi, opcode, &mut buf, timeout)?;
                println!("{}", commands::format_bytes(&buf));
            }
            Ok(())
        }
        // dumped above without configuring
        Some(Commands::DumpStatus) => Ok(()),
    }
}

fn print_data<R: RegisterFile>(
    spi: &mut SpiInstance<R>,
    table: &CommandTable,
    timeout: Option<Duration>,
) -> Result<(), HostError> {
    let data = commands::read_data(spi, table, timeout)?;
    println!("data:  {}", commands::format_bytes(&data));
    Ok(())
}

fn print_clock<R: RegisterFile>(
    spi: &mut SpiInstance<R>,
    table: &CommandTable,
    timeout: Option<Duration>,
) -> Result<(), HostError> {
    let clock = commands::read_clock(spi, table, timeout)?;
    println!("clock: {} us ({:#010x})", clock, clock);
    Ok(())
}
