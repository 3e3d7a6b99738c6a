//! Test doubles for the engines
//!
//! `LoopbackRegs` is a minimal DW SSI model: every status read clocks at
//! most one frame while CS0 is selected, taking the inbound frame from a
//! scripted peer. `ScriptedPort` plays the SPI slave peripheral with a
//! scripted master on the other end.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::register_file::RegisterFile;
use crate::regs::*;
use crate::slave::SlavePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(Register),
    Write(Register, u32),
}

pub struct LoopbackRegs {
    depth: usize,
    ctrlr0: u32,
    ssienr: u32,
    ser: u32,
    baudr: u32,
    imr: u32,
    tx: VecDeque<u32>,
    rx: VecDeque<u32>,
    peer: VecDeque<u8>,
    sent: Vec<u8>,
    accesses: Vec<Access>,
    forced_busy: u32,
    stalled: bool,
    stray_after_write: usize,
    bad_ctrlr0_writes: usize,
}

impl LoopbackRegs {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ctrlr0: ctrlr0_with_frame_bits(0, 8),
            ssienr: SSIENR_ENABLE,
            ser: 0,
            baudr: 0,
            imr: 0x3f,
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            peer: VecDeque::new(),
            sent: Vec::new(),
            accesses: Vec::new(),
            forced_busy: 0,
            stalled: false,
            stray_after_write: 0,
            bad_ctrlr0_writes: 0,
        }
    }

    pub fn peer_bytes(&mut self, bytes: &[u8]) {
        self.peer.extend(bytes.iter().copied());
    }

    pub fn inject_rx(&mut self, frames: &[u32]) {
        self.rx.extend(frames.iter().copied());
    }

    pub fn force_busy(&mut self, reads: u32) {
        self.forced_busy = reads;
    }

    pub fn stall_clock(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    pub fn stray_after_write(&mut self, frames: usize) {
        self.stray_after_write = frames;
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn tx_level(&self) -> usize {
        self.tx.len()
    }

    pub fn rx_level(&self) -> usize {
        self.rx.len()
    }

    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    pub fn clear_accesses(&mut self) {
        self.accesses.clear();
    }

    pub fn ctrlr0_written_while_enabled(&self) -> usize {
        self.bad_ctrlr0_writes
    }

    fn frame_bits(&self) -> u32 {
        ctrlr0_frame_bits(self.ctrlr0)
    }

    fn clock_one(&mut self) {
        if self.stalled || self.ser == 0 || self.ssienr == 0 || self.rx.len() >= self.depth {
            return;
        }
        let Some(out) = self.tx.pop_front() else {
            return;
        };
        let bytes = (self.frame_bits() / 8) as usize;
        let mut inbound = 0u32;
        for i in (0..bytes).rev() {
            self.sent.push((out >> (i * 8)) as u8);
            inbound = (inbound << 8) | u32::from(self.peer.pop_front().unwrap_or(0));
        }
        self.rx.push_back(inbound);
    }

    fn status_bits(&mut self) -> u32 {
        self.clock_one();
        let mut status = Status::empty();
        let shifting = self.ser != 0 && self.ssienr != 0 && !self.tx.is_empty();
        if self.forced_busy > 0 {
            self.forced_busy -= 1;
            status |= Status::BUSY;
        } else if shifting && !self.stalled {
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
        status.bits()
    }
}

impl RegisterFile for LoopbackRegs {
    fn read(&mut self, reg: Register) -> u32 {
        self.accesses.push(Access::Read(reg));
        match reg {
            Register::Ctrlr0 => self.ctrlr0,
            Register::Ssienr => self.ssienr,
            Register::Ser => self.ser,
            Register::Baudr => self.baudr,
            Register::Imr => self.imr,
            Register::Txflr => self.tx.len() as u32,
            Register::Rxflr => self.rx.len() as u32,
            Register::Sr => self.status_bits(),
            Register::Dr => {
                let frame = self.rx.pop_front().unwrap_or(0);
                if self.rx.is_empty() && self.stray_after_write > 0 {
                    for _ in 0..self.stray_after_write {
                        self.rx.push_back(0xEE);
                    }
                    self.stray_after_write = 0;
                }
                frame
            }
            _ => 0,
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        self.accesses.push(Access::Write(reg, value));
        match reg {
            Register::Ctrlr0 => {
                if self.ssienr != 0 {
                    self.bad_ctrlr0_writes += 1;
                } else {
                    self.ctrlr0 = value;
                }
            }
            Register::Ssienr => {
                self.ssienr = value & SSIENR_ENABLE;
                if self.ssienr == 0 {
                    self.tx.clear();
                    self.rx.clear();
                }
            }
            Register::Ser => self.ser = value,
            Register::Baudr => self.baudr = value,
            Register::Imr => self.imr = value,
            Register::Dr => {
                if self.tx.len() < self.depth {
                    self.tx.push_back(value);
                }
            }
            _ => {}
        }
    }
}

/// Slave peripheral double with a scripted master on the bus
///
/// Each readable query lets the master clock one byte if it has one queued:
/// the master's byte lands in our RX FIFO and our oldest TX byte (or the
/// underflow filler) goes out. Writable queries never clock, so bytes pushed
/// right after a query are in place for the next frame.
pub struct ScriptedPort {
    depth: usize,
    tx: VecDeque<u8>,
    rx: VecDeque<u8>,
    master_out: VecDeque<u8>,
    master_in: Vec<u8>,
}

impl ScriptedPort {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            master_out: VecDeque::new(),
            master_in: Vec::new(),
        }
    }

    /// Bytes the master will clock out, one per status query
    pub fn master_sends(&mut self, bytes: &[u8]) {
        self.master_out.extend(bytes.iter().copied());
    }

    /// Bytes the master has received from us
    pub fn master_received(&self) -> &[u8] {
        &self.master_in
    }

    pub fn rx_level(&self) -> usize {
        self.rx.len()
    }

    fn clock_one(&mut self) {
        if self.rx.len() >= self.depth {
            return;
        }
        if let Some(byte) = self.master_out.pop_front() {
            self.rx.push_back(byte);
            self.master_in.push(self.tx.pop_front().unwrap_or(0));
        }
    }
}

impl SlavePort for ScriptedPort {
    fn is_readable(&mut self) -> bool {
        self.clock_one();
        !self.rx.is_empty()
    }

    fn is_writable(&mut self) -> bool {
        self.tx.len() < self.depth
    }

    fn read_data(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn write_data(&mut self, byte: u8) {
        if self.tx.len() < self.depth {
            self.tx.push_back(byte);
        }
    }
}
