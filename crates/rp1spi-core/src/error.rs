//! Error types for rp1spi-core
//!
//! The master engine reports a small closed set of outcomes. Success is
//! `Ok(..)`; the failures below mirror the numeric status codes used on the
//! wire by tooling (`OK = 0` is implied).

use core::fmt;

/// Transaction engine error - no_std compatible, Copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Generic failure (reserved, no current path produces it)
    Error,
    /// The instance already has a transfer in flight
    Busy,
    /// The transfer deadline expired before all frames were collected
    Timeout,
    /// The request itself is invalid (zero-length transfer)
    Invalid,
}

impl Error {
    /// Numeric status code (`OK` is 0)
    pub const fn code(self) -> u8 {
        match self {
            Self::Error => 1,
            Self::Busy => 2,
            Self::Timeout => 3,
            Self::Invalid => 4,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "SPI error"),
            Self::Busy => write!(f, "SPI instance busy with another transfer"),
            Self::Timeout => write!(f, "SPI transfer timed out"),
            Self::Invalid => write!(f, "invalid SPI transfer request"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
