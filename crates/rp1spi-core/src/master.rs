//! Host-side master transaction engine for the DW APB SSI
//!
//! Every frame the master shifts out clocks exactly one frame in. Reads are
//! therefore driven by writing dummy frames: the TX FIFO is pre-stuffed with
//! zeros before chip select is asserted, so the clock starts the moment the
//! line goes active, and then TX fill and RX drain alternate until the
//! requested number of frames has been collected.
//!
//! Each operation exists as a poll-driven state machine ([`WriteByte`],
//! [`ReadTransfer`]) that performs one step per call, and as a blocking
//! wrapper on [`SpiInstance`] that spins on `poll()`.
//!
//! # Busy latch
//!
//! [`SpiInstance`] carries a pending-frame count. It is non-zero for the
//! whole lifetime of a transfer and any operation started while it is
//! non-zero fails with [`Error::Busy`] before touching a register.

use core::marker::PhantomData;
use core::task::Poll;

use crate::config::{FrameSize, SpiConfig};
use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::register_file::{RegisterFile, RegisterSnapshot};
use crate::regs::*;

/// Value shifted out while reading
pub const DUMMY_FRAME: u32 = 0x00;

/// A data frame type moved through the data register
pub trait Frame: Copy {
    /// Frame width on the wire
    const SIZE: FrameSize;

    /// Frame from a raw data register value
    fn from_raw(raw: u32) -> Self;
}

impl Frame for u8 {
    const SIZE: FrameSize = FrameSize::Bits8;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        raw as u8
    }
}

impl Frame for u32 {
    const SIZE: FrameSize = FrameSize::Bits32;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        raw
    }
}

/// One SSI peripheral owned by the host
pub struct SpiInstance<R> {
    regs: R,
    /// Frames still owed by the transfer in flight (0 = idle)
    pending: usize,
}

impl<R: RegisterFile> SpiInstance<R> {
    /// Wrap the register file of one SSI instance
    pub fn new(regs: R) -> Self {
        Self { regs, pending: 0 }
    }

    /// Access the underlying register file
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the register file
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Frames still owed by the transfer in flight
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// True while a transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.pending != 0
    }

    fn check_idle(&self) -> Result<()> {
        if self.pending != 0 {
            log::debug!("SPI instance busy ({} frames pending)", self.pending);
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Sample the status register
    pub fn status(&mut self) -> Status {
        self.regs.status()
    }

    /// Capture all side-effect-free registers
    pub fn snapshot(&mut self) -> RegisterSnapshot {
        RegisterSnapshot::capture(&mut self.regs)
    }

    /// Program clock divider, mode and frame size, then enable the core
    ///
    /// CTRLR0 and BAUDR are only writable while the SSI is disabled, so the
    /// core is disabled for the duration. Interrupts are masked, DMA
    /// handshaking is switched off and any latched interrupt is cleared.
    pub fn configure(&mut self, config: &SpiConfig) -> Result<()> {
        self.check_idle()?;

        self.regs.write(Register::Ssienr, 0);
        self.regs.write(Register::Baudr, u32::from(config.clock_divider));

        let ctrlr0 = self.regs.read(Register::Ctrlr0);
        let keep = ctrlr0 & !(CTRLR0_MODE_MASK | CTRLR0_FRF_MASK | CTRLR0_TMOD_MASK | CTRLR0_DFS32_MASK);
        self.regs.write(Register::Ctrlr0, keep | config.ctrlr0());

        self.regs.write(Register::Imr, Interrupts::empty().bits());
        self.regs.clear_bits(Register::Dmacr, DmaControl::all().bits());
        let cleared = self.regs.read(Register::Icr);
        self.regs.set_bits(Register::Ssienr, SSIENR_ENABLE);

        log::info!(
            "SPI configured: {} Hz (divider {}), {:?}, {}-bit frames",
            config.clock_hz(),
            config.clock_divider,
            config.mode,
            config.frame.bits()
        );
        log::debug!("CTRLR0 {:#010x}, ICR read {:#x}", self.regs.read(Register::Ctrlr0), cleared);
        Ok(())
    }

    /// Switch the frame size, returning the previous CTRLR0 if it changed
    fn set_frame_size(&mut self, frame: FrameSize) -> Option<u32> {
        let ctrlr0 = self.regs.read(Register::Ctrlr0);
        if ctrlr0_frame_bits(ctrlr0) == frame.bits() {
            return None;
        }
        self.write_ctrlr0(ctrlr0_with_frame_bits(ctrlr0, frame.bits()));
        Some(ctrlr0)
    }

    /// Write CTRLR0 with the core disabled, restoring the enable state
    fn write_ctrlr0(&mut self, value: u32) {
        let enabled = self.regs.read(Register::Ssienr);
        self.regs.write(Register::Ssienr, 0);
        self.regs.write(Register::Ctrlr0, value);
        self.regs.write(Register::Ssienr, enabled);
    }

    /// Write one byte and discard the byte clocked in alongside it
    ///
    /// Spins on BUSY, then on TX space, asserts CS0, pushes the byte and
    /// waits until the read-back frame is available and the shifter has
    /// stopped. Returns the discarded read-back byte.
    pub fn write_byte_blocking(&mut self, byte: u8) -> Result<u8> {
        let mut write = WriteByte::start(self, byte)?;
        loop {
            if let Poll::Ready(read_back) = write.poll(self) {
                return Ok(read_back);
            }
            core::hint::spin_loop();
        }
    }

    /// Read `buf.len()` bytes by clocking out dummy frames
    pub fn read_bytes_blocking<D: Deadline>(&mut self, buf: &mut [u8], deadline: D) -> Result<()> {
        self.read_frames_blocking(buf, deadline)
    }

    /// Read `buf.len()` 32-bit words using 32-bit frames
    ///
    /// The frame size is switched for the transfer and restored afterwards,
    /// and chip select is de-asserted explicitly on completion.
    pub fn read_words32<D: Deadline>(&mut self, buf: &mut [u32], deadline: D) -> Result<()> {
        self.read_frames_blocking(buf, deadline)
    }

    fn read_frames_blocking<F: Frame, D: Deadline>(
        &mut self,
        buf: &mut [F],
        mut deadline: D,
    ) -> Result<()> {
        let mut transfer = ReadTransfer::<F>::start(self, buf.len())?;
        loop {
            if transfer.poll(self, buf).is_ready() {
                return Ok(());
            }
            if deadline.expired() {
                log::warn!(
                    "SPI read timed out after {}/{} frames",
                    transfer.received(),
                    transfer.len()
                );
                transfer.abort(self);
                return Err(Error::Timeout);
            }
            core::hint::spin_loop();
        }
    }

    /// Drain and discard residual RX frames, returning how many were dropped
    ///
    /// At low clock rates a frame can land in the RX FIFO after a single
    /// byte write has already returned; left there it would shift every
    /// byte of the next read by one.
    pub fn purge_rx_fifo(&mut self) -> Result<usize> {
        self.check_idle()?;

        let mut purged = 0;
        while self.regs.status().contains(Status::RF_NOT_EMPTY) {
            let frame = self.regs.read(Register::Dr);
            log::trace!("purge: discarded {:#x}", frame);
            purged += 1;
        }
        Ok(purged)
    }

    /// Send a one-byte opcode and read its fixed-size response
    ///
    /// Stray RX frames left by the opcode write are purged before the read.
    /// An empty `response` sends the opcode only.
    pub fn command<D: Deadline>(&mut self, opcode: u8, response: &mut [u8], deadline: D) -> Result<()> {
        log::debug!("command {:#04x}, expecting {} bytes", opcode, response.len());
        self.write_byte_blocking(opcode)?;

        let purged = self.purge_rx_fifo()?;
        if purged > 0 {
            log::warn!("purged {} stray frames after opcode {:#04x}", purged, opcode);
        }

        if response.is_empty() {
            return Ok(());
        }
        self.read_bytes_blocking(response, deadline)
    }

    /// Execute a [`TransferRequest`]
    pub fn transfer<F: Frame, D: Deadline>(&mut self, request: TransferRequest<'_, F, D>) -> Result<()> {
        let TransferRequest {
            direction,
            buf,
            deadline,
        } = request;

        match direction {
            Direction::WriteOnly(byte) => {
                let read_back = self.write_byte_blocking(byte)?;
                if let Some(slot) = buf.first_mut() {
                    *slot = F::from_raw(u32::from(read_back));
                }
                Ok(())
            }
            Direction::ReadOnly => self.read_frames_blocking(buf, deadline),
            Direction::ReadAfterWrite(byte) => {
                self.write_byte_blocking(byte)?;
                let purged = self.purge_rx_fifo()?;
                if purged > 0 {
                    log::warn!("purged {} stray frames after opcode {:#04x}", purged, byte);
                }
                self.read_frames_blocking(buf, deadline)
            }
        }
    }
}

/// What a [`TransferRequest`] does on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Write a single byte; the read-back lands in `buf[0]` if present
    WriteOnly(u8),
    /// Read `buf.len()` frames
    ReadOnly,
    /// Write a single byte, purge, then read `buf.len()` frames
    ReadAfterWrite(u8),
}

/// One synchronous transfer, consumed by [`SpiInstance::transfer`]
///
/// The frame width follows the buffer element type (`u8` or `u32`).
pub struct TransferRequest<'a, F, D> {
    /// Bus direction
    pub direction: Direction,
    /// Receive buffer; its length is the payload length in frames
    pub buf: &'a mut [F],
    /// When to give up on a read
    pub deadline: D,
}

/// States of a single byte write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Waiting for the shifter to go idle
    WaitIdle,
    /// Waiting for space in the TX FIFO
    WaitTxSpace,
    /// Byte pushed, waiting for its read-back frame
    WaitReadBack,
    /// Read-back drained
    Done,
}

/// Poll-driven single byte write with mandatory read-back
#[derive(Debug)]
pub struct WriteByte {
    byte: u8,
    state: WriteState,
    read_back: u8,
    /// CTRLR0 to restore when the frame size was switched to 8 bits
    saved_ctrlr0: Option<u32>,
}

impl WriteByte {
    /// Claim the instance for a one-byte write
    pub fn start<R: RegisterFile>(spi: &mut SpiInstance<R>, byte: u8) -> Result<Self> {
        spi.check_idle()?;
        spi.pending = 1;
        // one byte on the wire whatever frame size is configured
        let saved_ctrlr0 = spi.set_frame_size(FrameSize::Bits8);
        Ok(Self {
            byte,
            state: WriteState::WaitIdle,
            read_back: 0,
            saved_ctrlr0,
        })
    }

    /// Current state
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Advance as far as the hardware allows, sampling status fresh each step
    pub fn poll<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>) -> Poll<u8> {
        loop {
            match self.state {
                WriteState::WaitIdle => {
                    if spi.regs.status().contains(Status::BUSY) {
                        return Poll::Pending;
                    }
                    self.state = WriteState::WaitTxSpace;
                }
                WriteState::WaitTxSpace => {
                    if !spi.regs.status().contains(Status::TF_NOT_FULL) {
                        return Poll::Pending;
                    }
                    spi.regs.write(Register::Ser, SER_CS0);
                    spi.regs.write(Register::Dr, u32::from(self.byte));
                    self.state = WriteState::WaitReadBack;
                }
                WriteState::WaitReadBack => {
                    if !spi.regs.status().read_back_ready() {
                        return Poll::Pending;
                    }
                    self.read_back = spi.regs.read(Register::Dr) as u8;
                    log::trace!("write {:#04x}: discarded read-back {:#04x}", self.byte, self.read_back);
                    if let Some(ctrlr0) = self.saved_ctrlr0.take() {
                        spi.write_ctrlr0(ctrlr0);
                    }
                    spi.pending = 0;
                    self.state = WriteState::Done;
                }
                WriteState::Done => return Poll::Ready(self.read_back),
            }
        }
    }

    /// Give up on the write: de-assert CS and release the busy latch
    ///
    /// The byte may still be in the TX FIFO and its read-back may arrive
    /// later; purge before the next read.
    pub fn abort<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>) {
        spi.regs.write(Register::Ser, 0);
        if let Some(ctrlr0) = self.saved_ctrlr0.take() {
            spi.write_ctrlr0(ctrlr0);
        }
        spi.pending = 0;
        self.state = WriteState::Done;
    }
}

/// Phases of a dummy-clocked read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    /// Filling the TX FIFO before chip select
    Prestuff,
    /// Alternating TX fill and RX drain
    Streaming,
    /// All dummies sent, collecting the remaining frames
    Draining,
    /// All frames collected
    Done,
}

/// Poll-driven N-frame read
#[derive(Debug)]
pub struct ReadTransfer<F> {
    len: usize,
    tx_remaining: usize,
    received: usize,
    /// Frames allowed in flight, measured as the prestuffed TX depth
    window: usize,
    phase: ReadPhase,
    /// CTRLR0 to restore when the frame size was switched
    saved_ctrlr0: Option<u32>,
    _frame: PhantomData<F>,
}

impl<F: Frame> ReadTransfer<F> {
    /// Validate the request and claim the instance
    ///
    /// Fails with [`Error::Busy`] if a transfer is in flight and with
    /// [`Error::Invalid`] for a zero-length read; neither touches a register.
    pub fn start<R: RegisterFile>(spi: &mut SpiInstance<R>, len: usize) -> Result<Self> {
        spi.check_idle()?;
        if len == 0 {
            return Err(Error::Invalid);
        }

        spi.pending = len;
        let saved_ctrlr0 = spi.set_frame_size(F::SIZE);
        log::debug!(
            "SPI read: {} x {}-bit frames ({} bytes)",
            len,
            F::SIZE.bits(),
            len * F::SIZE.bytes()
        );

        Ok(Self {
            len,
            tx_remaining: len,
            received: 0,
            window: 0,
            phase: ReadPhase::Prestuff,
            saved_ctrlr0,
            _frame: PhantomData,
        })
    }

    /// Requested number of frames
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; zero-length reads are rejected by [`ReadTransfer::start`]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frames collected so far
    pub fn received(&self) -> usize {
        self.received
    }

    /// Current phase
    pub fn phase(&self) -> ReadPhase {
        self.phase
    }

    fn take_frame<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>, buf: &mut [F]) {
        let raw = spi.regs.read(Register::Dr) & F::SIZE.mask();
        if let Some(slot) = buf.get_mut(self.received) {
            *slot = F::from_raw(raw);
        }
        self.received += 1;
        spi.pending = self.len - self.received;
    }

    /// Perform one step of the transfer
    ///
    /// `buf` must hold at least [`ReadTransfer::len`] frames and be the same
    /// buffer on every call. Frames beyond its end are clocked but dropped.
    pub fn poll<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>, buf: &mut [F]) -> Poll<()> {
        debug_assert!(buf.len() >= self.len, "read buffer shorter than the transfer");
        match self.phase {
            ReadPhase::Prestuff => {
                // CS may still be asserted from an opcode write
                spi.regs.write(Register::Ser, 0);
                while self.tx_remaining > 0 && spi.regs.status().contains(Status::TF_NOT_FULL) {
                    spi.regs.write(Register::Dr, DUMMY_FRAME);
                    self.tx_remaining -= 1;
                }
                self.window = (self.len - self.tx_remaining).max(1);
                // the clock starts here since frames are already queued
                spi.regs.write(Register::Ser, SER_CS0);
                self.phase = if self.tx_remaining > 0 {
                    ReadPhase::Streaming
                } else {
                    ReadPhase::Draining
                };
                Poll::Pending
            }
            ReadPhase::Streaming => {
                // the master clocks whatever is queued, so never have more
                // frames out than the RX FIFO can hold
                let in_flight = self.len - self.tx_remaining - self.received;
                if in_flight < self.window && spi.regs.status().contains(Status::TF_NOT_FULL) {
                    spi.regs.write(Register::Dr, DUMMY_FRAME);
                    self.tx_remaining -= 1;
                }
                if self.received < self.len && spi.regs.status().contains(Status::RF_NOT_EMPTY) {
                    self.take_frame(spi, buf);
                }
                if self.tx_remaining == 0 {
                    self.phase = ReadPhase::Draining;
                }
                self.check_done(spi)
            }
            ReadPhase::Draining => {
                if spi.regs.status().contains(Status::RF_NOT_EMPTY) {
                    self.take_frame(spi, buf);
                }
                self.check_done(spi)
            }
            ReadPhase::Done => Poll::Ready(()),
        }
    }

    fn check_done<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>) -> Poll<()> {
        if self.phase != ReadPhase::Draining || self.received < self.len {
            return Poll::Pending;
        }
        self.finish(spi);
        Poll::Ready(())
    }

    fn finish<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>) {
        if F::SIZE == FrameSize::Bits32 {
            spi.regs.write(Register::Ser, 0);
        }
        if let Some(ctrlr0) = self.saved_ctrlr0.take() {
            spi.write_ctrlr0(ctrlr0);
        }
        spi.pending = 0;
        self.phase = ReadPhase::Done;
    }

    /// Give up on the transfer: de-assert CS, restore the frame size and
    /// release the busy latch
    ///
    /// Frames may remain in either FIFO; purge before the next read.
    pub fn abort<R: RegisterFile>(&mut self, spi: &mut SpiInstance<R>) {
        spi.regs.write(Register::Ser, 0);
        if let Some(ctrlr0) = self.saved_ctrlr0.take() {
            spi.write_ctrlr0(ctrlr0);
        }
        spi.pending = 0;
        self.phase = ReadPhase::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::{NoDeadline, PollBudget};
    use crate::testing::{Access, LoopbackRegs};
    use std::vec;
    use std::vec::Vec;

    fn instance(peer: &[u8]) -> SpiInstance<LoopbackRegs> {
        let mut regs = LoopbackRegs::new(8);
        regs.peer_bytes(peer);
        SpiInstance::new(regs)
    }

    #[test]
    fn test_write_byte_returns_read_back() {
        let mut spi = instance(&[0xA5]);
        let read_back = spi.write_byte_blocking(0x42).unwrap();
        assert_eq!(read_back, 0xA5);
        assert_eq!(spi.regs_mut().sent(), &[0x42]);
        assert_eq!(spi.regs_mut().rx_level(), 0);
        assert!(!spi.is_busy());
    }

    #[test]
    fn test_write_byte_under_wide_frames() {
        let mut spi = instance(&[0xAB, 0x11, 0x22, 0x33, 0x44]);
        spi.configure(&SpiConfig::default().with_frame(FrameSize::Bits32))
            .unwrap();
        let before = spi.regs_mut().read(Register::Ctrlr0);

        assert_eq!(spi.write_byte_blocking(0x04), Ok(0xAB));
        assert_eq!(spi.regs_mut().sent(), &[0x04]);
        assert_eq!(spi.regs_mut().read(Register::Ctrlr0), before);
        assert_eq!(spi.regs_mut().ctrlr0_written_while_enabled(), 0);

        // the configured width is back in force for the next read
        let mut words = [0u32; 1];
        spi.read_words32(&mut words, NoDeadline).unwrap();
        assert_eq!(words, [0x1122_3344]);
    }

    #[test]
    fn test_aborted_write_restores_frame_size() {
        let mut spi = instance(&[]);
        spi.configure(&SpiConfig::default().with_frame(FrameSize::Bits32))
            .unwrap();
        let before = spi.regs_mut().read(Register::Ctrlr0);
        spi.regs_mut().stall_clock(true);

        let mut write = WriteByte::start(&mut spi, 0x02).unwrap();
        assert_eq!(ctrlr0_frame_bits(spi.regs_mut().read(Register::Ctrlr0)), 8);
        assert!(write.poll(&mut spi).is_pending());
        write.abort(&mut spi);

        assert_eq!(spi.regs_mut().read(Register::Ctrlr0), before);
        assert!(!spi.is_busy());
    }

    #[test]
    fn test_write_waits_for_busy_to_clear() {
        let mut spi = instance(&[0x00]);
        spi.regs_mut().force_busy(3);
        let mut write = WriteByte::start(&mut spi, 0x01).unwrap();
        assert!(write.poll(&mut spi).is_pending());
        assert_eq!(write.state(), WriteState::WaitIdle);
        assert!(spi.regs_mut().sent().is_empty());

        let mut polls = 0;
        while write.poll(&mut spi).is_pending() {
            polls += 1;
            assert!(polls < 100);
        }
        assert_eq!(spi.regs_mut().sent(), &[0x01]);
    }

    #[test]
    fn test_read_bytes_in_order() {
        let peer: Vec<u8> = (1..=32).collect();
        let mut spi = instance(&peer);
        let mut buf = [0u8; 32];
        spi.read_bytes_blocking(&mut buf, NoDeadline).unwrap();
        assert_eq!(&buf[..], &peer[..]);
        // one dummy out per byte in
        assert_eq!(spi.regs_mut().sent(), &[0u8; 32][..]);
        assert_eq!(spi.pending(), 0);
    }

    #[test]
    fn test_read_zero_length_is_invalid() {
        let mut spi = instance(&[]);
        let mut buf: [u8; 0] = [];
        assert_eq!(spi.read_bytes_blocking(&mut buf, NoDeadline), Err(Error::Invalid));
        assert!(spi.regs_mut().accesses().is_empty());
    }

    #[test]
    fn test_operations_while_busy_fail_without_access() {
        let mut spi = instance(&[1, 2, 3, 4]);
        let mut buf = [0u8; 4];
        let mut transfer = ReadTransfer::<u8>::start(&mut spi, 4).unwrap();
        assert!(transfer.poll(&mut spi, &mut buf).is_pending());
        assert!(spi.is_busy());

        spi.regs_mut().clear_accesses();
        let mut other = [0xEEu8; 2];
        assert_eq!(spi.read_bytes_blocking(&mut other, NoDeadline), Err(Error::Busy));
        assert_eq!(spi.write_byte_blocking(0x10), Err(Error::Busy));
        assert_eq!(spi.purge_rx_fifo(), Err(Error::Busy));
        let mut words = [0u32; 1];
        assert_eq!(spi.read_words32(&mut words, NoDeadline), Err(Error::Busy));
        assert!(spi.regs_mut().accesses().is_empty());
        assert_eq!(other, [0xEE; 2]);

        while transfer.poll(&mut spi, &mut buf).is_pending() {}
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(!spi.is_busy());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "read buffer shorter")]
    fn test_short_read_buffer_is_rejected() {
        let mut spi = instance(&[1, 2, 3, 4]);
        let mut buf = [0u8; 2];
        let mut transfer = ReadTransfer::<u8>::start(&mut spi, 4).unwrap();
        let _ = transfer.poll(&mut spi, &mut buf);
    }

    #[test]
    fn test_read_longer_than_fifo() {
        let peer: Vec<u8> = (0..100u8).collect();
        let mut spi = instance(&peer);
        let mut buf = vec![0u8; 100];
        let mut transfer = ReadTransfer::<u8>::start(&mut spi, 100).unwrap();

        assert!(transfer.poll(&mut spi, &mut buf).is_pending());
        assert_eq!(transfer.phase(), ReadPhase::Streaming);
        assert_eq!(spi.regs_mut().tx_level(), 8);

        while transfer.poll(&mut spi, &mut buf).is_pending() {}
        assert_eq!(buf, peer);
        assert_eq!(transfer.phase(), ReadPhase::Done);
    }

    #[test]
    fn test_purge_is_idempotent() {
        let mut spi = instance(&[]);
        spi.regs_mut().inject_rx(&[9, 9, 9]);
        assert_eq!(spi.purge_rx_fifo(), Ok(3));
        assert_eq!(spi.purge_rx_fifo(), Ok(0));
    }

    #[test]
    fn test_read_words_switches_and_restores_frame_size() {
        let mut spi = instance(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
        spi.configure(&SpiConfig::default()).unwrap();
        let before = spi.regs_mut().read(Register::Ctrlr0);

        let mut words = [0u32; 2];
        spi.read_words32(&mut words, NoDeadline).unwrap();
        assert_eq!(words, [0x1122_3344, 0x5566_7788]);

        assert_eq!(spi.regs_mut().read(Register::Ctrlr0), before);
        assert_eq!(spi.regs_mut().read(Register::Ser), 0);
        // CTRLR0 only ever written with the core disabled
        assert!(spi.regs_mut().ctrlr0_written_while_enabled() == 0);
    }

    #[test]
    fn test_read_times_out_and_releases_latch() {
        let mut spi = instance(&[1, 2]);
        spi.regs_mut().stall_clock(true);
        let mut buf = [0u8; 4];
        assert_eq!(spi.read_bytes_blocking(&mut buf, PollBudget(50)), Err(Error::Timeout));
        assert!(!spi.is_busy());
        assert_eq!(spi.regs_mut().read(Register::Ser), 0);
    }

    #[test]
    fn test_command_purges_stray_frames() {
        let mut spi = instance(&[0x00, 7, 8, 9, 10]);
        spi.regs_mut().stray_after_write(2);
        let mut response = [0u8; 4];
        spi.command(0x04, &mut response, NoDeadline).unwrap();
        assert_eq!(response, [7, 8, 9, 10]);
        assert!(spi
            .regs_mut()
            .accesses()
            .iter()
            .any(|a| *a == Access::Write(Register::Dr, 0x04)));
    }

    #[test]
    fn test_transfer_request() {
        let mut spi = instance(&[0x5A, 1, 2, 3]);
        let mut read_back = [0u8; 1];
        spi.transfer(TransferRequest {
            direction: Direction::WriteOnly(0x02),
            buf: &mut read_back,
            deadline: NoDeadline,
        })
        .unwrap();
        assert_eq!(read_back, [0x5A]);

        let mut data = [0u8; 3];
        spi.transfer(TransferRequest {
            direction: Direction::ReadOnly,
            buf: &mut data,
            deadline: NoDeadline,
        })
        .unwrap();
        assert_eq!(data, [1, 2, 3]);
    }
}
