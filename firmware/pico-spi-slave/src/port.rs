//! RP2040 bindings for the dispatcher: SPI0 as slave port, the 1 MHz
//! timer as clock, the hardware watchdog

use embassy_rp::pac;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Instant};
use rp1spi_core::{MonotonicClock, SlavePort};

/// CSn pin of SPI0 (GP17)
const CSN_PIN: usize = 17;

/// IO_BANK0 function select for SPI
const FUNCSEL_SPI: u8 = 1;

/// SPI0 switched to slave mode
///
/// embassy-rp only drives the PL022 as a master, so it is used to set up
/// clocks, format and pins, and the mode switch plus all FIFO traffic go
/// through the PAC.
pub struct Spi0Slave {
    _spi: Spi<'static, SPI0, Blocking>,
    regs: pac::spi::Spi,
}

impl Spi0Slave {
    /// Take over a configured SPI0 and switch it to slave mode
    pub fn new(spi: Spi<'static, SPI0, Blocking>) -> Self {
        let regs = pac::SPI0;

        // MS may only change while SSE is clear
        regs.cr1().modify(|w| w.set_sse(false));
        regs.cr1().modify(|w| w.set_ms(true));
        regs.cr1().modify(|w| w.set_sse(true));

        // embassy does not route CSn
        pac::PADS_BANK0.gpio(CSN_PIN).modify(|w| {
            w.set_ie(true);
            w.set_od(false);
        });
        pac::IO_BANK0
            .gpio(CSN_PIN)
            .ctrl()
            .write(|w| w.set_funcsel(FUNCSEL_SPI));

        Self { _spi: spi, regs }
    }
}

impl SlavePort for Spi0Slave {
    #[inline]
    fn is_readable(&mut self) -> bool {
        self.regs.sr().read().rne()
    }

    #[inline]
    fn is_writable(&mut self) -> bool {
        self.regs.sr().read().tnf()
    }

    #[inline]
    fn read_data(&mut self) -> u8 {
        self.regs.dr().read().data() as u8
    }

    #[inline]
    fn write_data(&mut self, byte: u8) {
        self.regs.dr().write(|w| w.set_data(u16::from(byte)));
    }
}

/// Microseconds since boot, truncated to 32 bits
pub struct TimerClock;

impl MonotonicClock for TimerClock {
    fn now_us(&mut self) -> u32 {
        Instant::now().as_micros() as u32
    }
}

/// Hardware watchdog, started on construction
pub struct HwWatchdog(Watchdog);

impl HwWatchdog {
    /// Start `watchdog` with `period`, paused while a debugger halts the core
    pub fn start(mut watchdog: Watchdog, period: Duration) -> Self {
        watchdog.pause_on_debug(true);
        watchdog.start(period);
        Self(watchdog)
    }
}

impl rp1spi_core::Watchdog for HwWatchdog {
    fn feed(&mut self) {
        self.0.feed();
    }

    fn force_reset(&mut self) {
        defmt::info!("reset requested, waiting for the watchdog");
        self.0.trigger_reset();
    }
}
