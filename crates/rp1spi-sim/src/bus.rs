//! Simulated SPI bus
//!
//! One [`SimBus`] joins a DW APB SSI master model and a PL022-style slave
//! FIFO pair. A [`SimBus::tick`] shifts exactly one master frame: every
//! byte of it lands in the slave's RX FIFO and one byte from the slave's TX
//! FIFO (or the underflow filler) comes back, so both sides always see the
//! same number of bytes.
//!
//! The master only clocks while it is enabled, CS0 is selected and its TX
//! FIFO holds a frame. Overflowing either RX FIFO drops the byte and is
//! counted, which is how loss of synchronisation shows up in tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rp1spi_core::regs::*;

use crate::slave::SimSlave;
use crate::ssi::SimSsi;

/// Default FIFO depth on both sides
pub const DEFAULT_FIFO_DEPTH: usize = 8;

/// Master SSI model state
#[derive(Debug)]
pub(crate) struct MasterSide {
    pub(crate) depth: usize,
    pub(crate) ctrlr0: u32,
    pub(crate) ctrlr1: u32,
    pub(crate) ssienr: u32,
    pub(crate) ser: u32,
    pub(crate) baudr: u32,
    pub(crate) txftlr: u32,
    pub(crate) rxftlr: u32,
    pub(crate) imr: u32,
    pub(crate) dmacr: u32,
    pub(crate) risr: Interrupts,
    pub(crate) tx: VecDeque<u32>,
    pub(crate) rx: VecDeque<u32>,
    /// Writes to CTRLR0/CTRLR1/BAUDR while enabled, which the core ignores
    pub(crate) ignored_writes: usize,
}

impl MasterSide {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ctrlr0: ctrlr0_with_frame_bits(0, 8),
            ctrlr1: 0,
            ssienr: 0,
            ser: 0,
            baudr: 0,
            txftlr: 0,
            rxftlr: 0,
            imr: Interrupts::all().bits(),
            dmacr: 0,
            risr: Interrupts::empty(),
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            ignored_writes: 0,
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.ssienr & SSIENR_ENABLE != 0
    }

    pub(crate) fn status(&self, stalled: bool) -> Status {
        let mut status = Status::empty();
        if self.enabled() && self.ser != 0 && !self.tx.is_empty() && !stalled {
            status |= Status::BUSY;
        }
        if self.tx.len() < self.depth {
            status |= Status::TF_NOT_FULL;
        }
        if self.tx.is_empty() {
            status |= Status::TF_EMPTY;
        }
        if !self.rx.is_empty() {
            status |= Status::RF_NOT_EMPTY;
        }
        if self.rx.len() >= self.depth {
            status |= Status::RF_FULL;
        }
        status
    }
}

/// Slave peripheral FIFO state
#[derive(Debug)]
pub(crate) struct SlaveSide {
    pub(crate) depth: usize,
    pub(crate) tx: VecDeque<u8>,
    pub(crate) rx: VecDeque<u8>,
    pub(crate) filler: u8,
    pub(crate) overruns: usize,
    pub(crate) underflows: usize,
}

/// Shared state behind every handle of one bus
#[derive(Debug)]
pub(crate) struct BusState {
    pub(crate) master: MasterSide,
    pub(crate) slave: SlaveSide,
    pub(crate) auto_clock: bool,
    pub(crate) stalled: bool,
    frames: u64,
    mosi_log: Vec<u8>,
    miso_log: Vec<u8>,
}

impl BusState {
    /// Shift one master frame, returning false if the clock is not running
    pub(crate) fn tick(&mut self) -> bool {
        let master = &mut self.master;
        if self.stalled || !master.enabled() || master.ser == 0 {
            return false;
        }
        let Some(out) = master.tx.pop_front() else {
            return false;
        };

        let bits = ctrlr0_frame_bits(master.ctrlr0);
        let bytes = bits.div_ceil(8);
        let mut inbound = 0u32;
        for i in (0..bytes).rev() {
            let mosi = (out >> (i * 8)) as u8;
            let miso = match self.slave.tx.pop_front() {
                Some(byte) => byte,
                None => {
                    self.slave.underflows += 1;
                    self.slave.filler
                }
            };
            if self.slave.rx.len() < self.slave.depth {
                self.slave.rx.push_back(mosi);
            } else {
                self.slave.overruns += 1;
            }
            self.mosi_log.push(mosi);
            self.miso_log.push(miso);
            inbound = (inbound << 8) | u32::from(miso);
        }

        if master.rx.len() < master.depth {
            master.rx.push_back(inbound);
        } else {
            master.risr |= Interrupts::RXOI;
        }
        self.frames += 1;
        log::trace!("bus: frame {:#x} out, {:#x} in", out, inbound);
        true
    }
}

/// Handle to a simulated bus
///
/// Clones share the same bus. Not `Send`: the simulation is stepped from a
/// single thread.
#[derive(Clone)]
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    /// Bus with default FIFO depths on both sides
    pub fn new() -> Self {
        Self::with_fifo_depths(DEFAULT_FIFO_DEPTH, DEFAULT_FIFO_DEPTH)
    }

    /// Bus with explicit master and slave FIFO depths
    pub fn with_fifo_depths(master: usize, slave: usize) -> Self {
        let state = BusState {
            master: MasterSide::new(master),
            slave: SlaveSide {
                depth: slave,
                tx: VecDeque::new(),
                rx: VecDeque::new(),
                filler: 0x00,
                overruns: 0,
                underflows: 0,
            },
            auto_clock: false,
            stalled: false,
            frames: 0,
            mosi_log: Vec::new(),
            miso_log: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Register file of the master SSI
    pub fn master(&self) -> SimSsi {
        SimSsi::new(Rc::clone(&self.state))
    }

    /// Slave peripheral
    pub fn slave(&self) -> SimSlave {
        SimSlave::new(Rc::clone(&self.state))
    }

    /// Shift one frame if the master clock is running
    pub fn tick(&self) -> bool {
        self.state.borrow_mut().tick()
    }

    /// Tick until the master TX FIFO is empty or the clock stops
    ///
    /// Returns the number of frames shifted, at most `max_ticks`.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Shift a frame on every master status read
    ///
    /// Lets a blocking master call run without an outside loop.
    pub fn set_auto_clock(&self, enabled: bool) {
        self.state.borrow_mut().auto_clock = enabled;
    }

    /// Freeze the clock, as if the peer never answered
    pub fn set_stalled(&self, stalled: bool) {
        self.state.borrow_mut().stalled = stalled;
    }

    /// Byte the slave shifts out when its TX FIFO is empty
    pub fn set_underflow_filler(&self, filler: u8) {
        self.state.borrow_mut().slave.filler = filler;
    }

    /// Frames shifted so far
    pub fn frames(&self) -> u64 {
        self.state.borrow().frames
    }

    /// Every byte the master has shifted out
    pub fn mosi_log(&self) -> Vec<u8> {
        self.state.borrow().mosi_log.clone()
    }

    /// Every byte the slave has shifted out
    pub fn miso_log(&self) -> Vec<u8> {
        self.state.borrow().miso_log.clone()
    }

    /// Bytes dropped because the slave RX FIFO was full
    pub fn slave_overruns(&self) -> usize {
        self.state.borrow().slave.overruns
    }

    /// Bytes the slave sent from an empty TX FIFO
    pub fn slave_underflows(&self) -> usize {
        self.state.borrow().slave.underflows
    }

    /// True if the master RX FIFO has overflowed since the last clear
    pub fn master_rx_overflowed(&self) -> bool {
        self.state.borrow().master.risr.contains(Interrupts::RXOI)
    }

    /// Writes the master core ignored because it was enabled
    pub fn master_ignored_writes(&self) -> usize {
        self.state.borrow().master.ignored_writes
    }

    /// Frames waiting in the master RX FIFO
    pub fn master_rx_level(&self) -> usize {
        self.state.borrow().master.rx.len()
    }

    /// Bytes waiting in the slave RX FIFO
    pub fn slave_rx_level(&self) -> usize {
        self.state.borrow().slave.rx.len()
    }

    /// Bytes waiting in the slave TX FIFO
    pub fn slave_tx_level(&self) -> usize {
        self.state.borrow().slave.tx.len()
    }
}
