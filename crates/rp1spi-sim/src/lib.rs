//! rp1spi-sim - Simulated SPI bus for testing
//!
//! This crate joins a model of the RP1 DW APB SSI master and a model of an
//! SPI slave peripheral with a simulated clock, so both halves of the
//! transaction engine can run against each other without hardware. The
//! simulation is single-threaded and deterministic: a test steps the
//! poll-based machines of both sides and calls [`SimBus::tick`] in between.
//!
//! # Example
//!
//! ```
//! use rp1spi_core::{CommandDispatcher, SpiConfig, SpiInstance};
//! use rp1spi_sim::{run_command, SimBus, SimClock, SimWatchdog};
//!
//! let bus = SimBus::new();
//! let mut spi = SpiInstance::new(bus.master());
//! spi.configure(&SpiConfig::default()).unwrap();
//! let mut device = CommandDispatcher::new(bus.slave(), SimClock::new(0, 1), SimWatchdog::default());
//!
//! let mut data = [0u8; 32];
//! run_command(&bus, &mut spi, &mut device, 0x04, &mut data, 1000).unwrap();
//! assert_eq!(data[31], 32);
//! ```

pub mod bus;
pub mod slave;
pub mod ssi;

pub use bus::SimBus;
pub use slave::{SimClock, SimSlave, SimWatchdog};
pub use ssi::SimSsi;

use rp1spi_core::{
    CommandDispatcher, DispatchEvent, Error, MonotonicClock, ReadTransfer, Result, SpiInstance,
    Watchdog, WriteByte,
};

/// Send `opcode` from the master and read `response.len()` bytes back while
/// the device dispatcher runs on the other end
///
/// Each step polls the dispatcher, then the master machine, then shifts one
/// frame. Gives up with [`Error::Timeout`] after `max_ticks` steps of either
/// phase; the instance is released in that case.
pub fn run_command<C: MonotonicClock, W: Watchdog>(
    bus: &SimBus,
    spi: &mut SpiInstance<SimSsi>,
    device: &mut CommandDispatcher<SimSlave, C, W>,
    opcode: u8,
    response: &mut [u8],
    max_ticks: usize,
) -> Result<()> {
    let mut write = WriteByte::start(spi, opcode)?;
    let mut steps = 0;
    loop {
        device.poll();
        if write.poll(spi).is_ready() {
            break;
        }
        bus.tick();
        steps += 1;
        if steps > max_ticks {
            write.abort(spi);
            return Err(Error::Timeout);
        }
    }

    let purged = spi.purge_rx_fifo()?;
    if purged > 0 {
        log::warn!("sim: purged {} stray frames after {:#04x}", purged, opcode);
    }

    if !response.is_empty() {
        let mut read = ReadTransfer::<u8>::start(spi, response.len())?;
        steps = 0;
        loop {
            device.poll();
            if read.poll(spi, response).is_ready() {
                break;
            }
            bus.tick();
            steps += 1;
            if steps > max_ticks {
                read.abort(spi);
                return Err(Error::Timeout);
            }
        }
    }

    // let the device drain the last read-backs
    for _ in 0..max_ticks {
        if !matches!(device.poll(), DispatchEvent::Responding(_)) {
            break;
        }
    }
    Ok(())
}
