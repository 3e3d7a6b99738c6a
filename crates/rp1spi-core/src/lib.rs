//! rp1spi-core - SPI duplex transaction engines
//!
//! This crate holds both ends of a byte-oriented command/response exchange
//! over a physical SPI bus:
//!
//! - the host-side master engine ([`master`]) driving a DesignWare APB SSI
//!   core through a [`RegisterFile`],
//! - the device-side slave exchange ([`slave`]) driving an SPI peripheral in
//!   slave mode through a [`SlavePort`],
//! - the one-byte opcode protocol ([`protocol`]) and the device-side command
//!   loop ([`dispatcher`]) that rides on top of them.
//!
//! Everything is `no_std`. Every engine operation is an explicit state
//! machine with a `poll()` method plus a blocking wrapper that spins on it,
//! so the logic can be driven deterministically against a simulated
//! register file.
//!
//! # Features
//!
//! - `std` - `std::error::Error` for [`Error`] and the `Instant`-based
//!   [`deadline::Until`]
//! - `defmt` - device-side dispatcher messages go to `defmt` instead of
//!   `log`, and protocol types derive `defmt::Format`
//!
//! # Example
//!
//! ```ignore
//! use rp1spi_core::{NoDeadline, SpiConfig, SpiInstance};
//!
//! fn read_data<R: rp1spi_core::RegisterFile>(regs: R) -> rp1spi_core::Result<[u8; 32]> {
//!     let mut spi = SpiInstance::new(regs);
//!     spi.configure(&SpiConfig::default())?;
//!     let mut data = [0u8; 32];
//!     spi.command(0x04, &mut data, NoDeadline)?;
//!     Ok(data)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod deadline;
pub mod dispatcher;
pub mod error;
pub mod master;
pub mod protocol;
pub mod register_file;
pub mod regs;
pub mod slave;

#[cfg(test)]
mod testing;

pub use config::{FrameSize, SpiConfig, SpiMode};
pub use deadline::{Deadline, NoDeadline, PollBudget};
pub use dispatcher::{CommandDispatcher, DispatchEvent, MonotonicClock, Watchdog};
pub use error::{Error, Result};
pub use master::{Direction, ReadTransfer, SpiInstance, TransferRequest, WriteByte};
pub use protocol::{Command, CommandTable, ResponseShape};
pub use register_file::{RegisterFile, RegisterSnapshot};
pub use regs::{Register, Status};
pub use slave::{SlaveExchange, SlavePort, SlaveWrite};
