//! Host-side errors and process exit codes

use rp1spi_rp1::Rp1Error;
use thiserror::Error;

/// Failure of one step of a host run
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Invalid options: {0}")]
    Options(#[source] Rp1Error),

    #[error("Failed to map RP1 peripherals: {0}")]
    Map(#[source] Rp1Error),

    #[error("Failed to set up SPI{instance}: {source}")]
    Instance {
        instance: u8,
        #[source]
        source: Rp1Error,
    },

    #[error("Failed to send opcode {opcode:#04x}: {source}")]
    Send {
        opcode: u8,
        #[source]
        source: rp1spi_core::Error,
    },

    #[error("Failed to read {len} frames after opcode {opcode:#04x}: {source}")]
    Read {
        opcode: u8,
        len: usize,
        #[source]
        source: rp1spi_core::Error,
    },
}

impl HostError {
    /// Exit status reported to the shell
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Options(_) => 2,
            Self::Map(_) => 4,
            Self::Instance { .. } => 5,
            Self::Send { .. } => 6,
            Self::Read { .. } => 7,
        }
    }
}
