//! Slave side of the simulated bus

use std::cell::RefCell;
use std::rc::Rc;

use rp1spi_core::{MonotonicClock, SlavePort, Watchdog};

use crate::bus::BusState;

/// Simulated SPI slave peripheral (PL022-style FIFOs)
pub struct SimSlave {
    state: Rc<RefCell<BusState>>,
}

impl SimSlave {
    pub(crate) fn new(state: Rc<RefCell<BusState>>) -> Self {
        Self { state }
    }
}

impl SlavePort for SimSlave {
    fn is_readable(&mut self) -> bool {
        !self.state.borrow().slave.rx.is_empty()
    }

    fn is_writable(&mut self) -> bool {
        let bus = self.state.borrow();
        bus.slave.tx.len() < bus.slave.depth
    }

    fn read_data(&mut self) -> u8 {
        self.state.borrow_mut().slave.rx.pop_front().unwrap_or(0)
    }

    fn write_data(&mut self, byte: u8) {
        let mut bus = self.state.borrow_mut();
        if bus.slave.tx.len() < bus.slave.depth {
            bus.slave.tx.push_back(byte);
        }
    }
}

/// Microsecond counter advancing a fixed step per sample
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    now: u32,
    step: u32,
}

impl SimClock {
    /// Counter starting at `start`, advancing `step` µs per sample
    pub fn new(start: u32, step: u32) -> Self {
        Self { now: start, step }
    }
}

impl MonotonicClock for SimClock {
    fn now_us(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step);
        now
    }
}

/// Watchdog that records what the dispatcher asked of it
#[derive(Debug, Default, Clone, Copy)]
pub struct SimWatchdog {
    /// Number of feeds
    pub feeds: u64,
    /// Set once a reset was forced
    pub reset_requested: bool,
}

impl Watchdog for SimWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }

    fn force_reset(&mut self) {
        self.reset_requested = true;
    }
}
