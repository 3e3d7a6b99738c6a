//! rp1spi-rp1 - RP1 SSI access for the Raspberry Pi 5
//!
//! The RP1 south bridge hangs off PCIe and exposes its peripherals in BAR1.
//! This crate maps that window through `/dev/mem`, hands out the register
//! file of one DW APB SSI instance for [`rp1spi_core::SpiInstance`], and
//! parses the host option string.
//!
//! # Example
//!
//! ```no_run
//! use rp1spi_core::NoDeadline;
//! use rp1spi_rp1::{parse_options, split_options, Rp1};
//!
//! let opts = parse_options(&split_options("instance=0,divider=20,mode=1"))?;
//! let rp1 = Rp1::map()?;
//! let mut spi = rp1.open_spi(&opts)?;
//!
//! let mut data = [0u8; 32];
//! spi.command(0x04, &mut data, NoDeadline)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Raspberry Pi 5 (RP1 at PCI BAR1 `0x1f_0000_0000`)
//! - Root, or `CAP_SYS_RAWIO` with `/dev/mem` access
//! - No kernel SPI driver bound to the same instance

pub mod error;
pub mod options;
pub mod physmap;
pub mod rp1;

pub use error::{Result, Rp1Error};
pub use options::{parse_options, split_options, HostOptions};
pub use physmap::PhysMap;
pub use rp1::{MmioRegisters, Rp1};
