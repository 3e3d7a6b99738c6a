//! CLI command implementations
//!
//! Every command runs against any [`rp1spi_core::RegisterFile`], so the same
//! code drives the mapped RP1 window and the simulated bus in tests.

mod exchange;
mod status;

pub use exchange::{exchange, read_clock, read_data, send};
pub use status::print_status;

/// Format bytes as space-separated hex
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format 32-bit frames as space-separated hex
pub fn format_words(words: &[u32]) -> String {
    words
        .iter()
        .map(|w| format!("{:08x}", w))
        .collect::<Vec<_>>()
        .join(" ")
}
