//! Error types for RP1 host access

use thiserror::Error;

/// RP1 host-side errors
#[derive(Debug, Error)]
pub enum Rp1Error {
    /// Mapping the physical window failed
    #[error("Failed to map {size:#x} bytes of physical memory at {address:#x}: {source}")]
    MemoryMap {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// Physical memory mapping is not available on this platform
    #[error("Not supported: {0}")]
    NotSupported(&'static str),

    /// No SSI instance with this number exists
    #[error("Invalid SPI instance {0} (RP1 has SPI0 to SPI8)")]
    InvalidInstance(u8),

    /// The instance exists but is not routed to the GPIO header
    #[error("SPI{0} is not available on GPIO (usable: SPI0 to SPI5)")]
    InstanceUnavailable(u8),

    /// Bad host option
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Transaction engine error
    #[error("SPI error: {0}")]
    Spi(#[from] rp1spi_core::Error),
}

/// Result type for RP1 operations
pub type Result<T> = std::result::Result<T, Rp1Error>;
