//! rp1spi command responder firmware for Raspberry Pi Pico
//!
//! Runs the command dispatcher on SPI0 in slave mode. The host (an RP1 SSI
//! master on a Raspberry Pi 5) sends one opcode byte and then clocks out the
//! fixed-length response.
//!
//! ## Pin Assignments
//!
//! | Pin   | Function            |
//! |-------|---------------------|
//! | GP16  | SPI0 RX (from MOSI) |
//! | GP17  | SPI0 CSn            |
//! | GP18  | SPI0 SCK            |
//! | GP19  | SPI0 TX (to MISO)   |
//!
//! SPI mode 1 (CPOL=0, CPHA=1), 8-bit frames, MSB first. The watchdog
//! period is 3 s; a response the host never clocks out reboots the device.

#![no_std]
#![no_main]

mod port;

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::spi::{self, Phase, Polarity, Spi};
use embassy_rp::watchdog::Watchdog;
use embassy_time::Duration;
use rp1spi_core::CommandDispatcher;
use {defmt_rtt as _, panic_probe as _};

use crate::port::{HwWatchdog, Spi0Slave, TimerClock};

/// Nominal bus clock; in slave mode only the prescaler ratio matters
const SPI_FREQUENCY: u32 = 10_000_000;

/// Watchdog period
const WATCHDOG_PERIOD: Duration = Duration::from_millis(3000);

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("pico-spi-slave starting...");

    let p = embassy_rp::init(Default::default());

    let mut config = spi::Config::default();
    config.frequency = SPI_FREQUENCY;
    config.polarity = Polarity::IdleLow;
    config.phase = Phase::CaptureOnSecondTransition;

    let spi = Spi::new_blocking(
        p.SPI0,
        p.PIN_18, // SCK
        p.PIN_19, // TX
        p.PIN_16, // RX
        config,
    );
    let _csn = p.PIN_17;
    let port = Spi0Slave::new(spi);

    let watchdog = HwWatchdog::start(Watchdog::new(p.WATCHDOG), WATCHDOG_PERIOD);
    let mut dispatcher = CommandDispatcher::new(port, TimerClock, watchdog);

    info!("SPI slave waiting for commands");
    dispatcher.run()
}
