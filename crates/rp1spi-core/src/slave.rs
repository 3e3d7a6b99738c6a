//! Device-side byte exchange over an SPI peripheral in slave mode
//!
//! The slave never drives the clock. Every byte it transmits leaves only
//! when the master clocks a frame, and that same frame deposits one byte in
//! the slave's RX FIFO. Writes therefore always drain one inbound byte per
//! outbound byte, or the RX FIFO eventually overruns.
//!
//! There is no error path: a primitive either completes or spins until the
//! master supplies the clocks. The dispatcher's watchdog is the only way out.

use core::task::Poll;

/// Minimal view of an SPI peripheral in slave mode
pub trait SlavePort {
    /// True if the RX FIFO holds at least one byte
    fn is_readable(&mut self) -> bool;

    /// True if the TX FIFO has room for a byte
    fn is_writable(&mut self) -> bool;

    /// Pop one byte from the RX FIFO
    fn read_data(&mut self) -> u8;

    /// Push one byte into the TX FIFO
    fn write_data(&mut self, byte: u8);
}

impl<T: SlavePort + ?Sized> SlavePort for &mut T {
    fn is_readable(&mut self) -> bool {
        (**self).is_readable()
    }

    fn is_writable(&mut self) -> bool {
        (**self).is_writable()
    }

    fn read_data(&mut self) -> u8 {
        (**self).read_data()
    }

    fn write_data(&mut self, byte: u8) {
        (**self).write_data(byte)
    }
}

/// Bytes to transmit, addressed by index
pub trait ByteSource {
    /// Number of bytes
    fn byte_len(&self) -> usize;

    /// Byte at `index`
    fn byte_at(&self, index: usize) -> u8;
}

impl ByteSource for &[u8] {
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    fn byte_len(&self) -> usize {
        N
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

impl<const N: usize> ByteSource for heapless::Vec<u8, N> {
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

/// 32-bit words sent most significant byte first, matching a master
/// reading 32-bit frames
#[derive(Debug, Clone, Copy)]
pub struct BeWords<'a>(pub &'a [u32]);

impl ByteSource for BeWords<'_> {
    fn byte_len(&self) -> usize {
        self.0.len() * 4
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.0[index / 4].to_be_bytes()[index % 4]
    }
}

/// States of an exchange primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing started
    Idle,
    /// Waiting for TX FIFO space
    WritableWait,
    /// Byte pushed
    Written,
    /// Waiting for the paired inbound byte
    ReadableWait,
    /// All paired bytes drained
    Drained,
}

/// Poll-driven write of a byte sequence with read-back draining
///
/// In strict mode each byte waits for its own read-back before the next
/// push. In pipelined mode a read-back is drained opportunistically after
/// each push and the shortfall is mopped up once all bytes are queued; at
/// speed the FIFOs fill asynchronously to this loop and strict one-for-one
/// draining would fall behind.
#[derive(Debug)]
pub struct SlaveWrite<B> {
    data: B,
    pushed: usize,
    drained: usize,
    pipelined: bool,
    state: ExchangeState,
}

impl<B: ByteSource> SlaveWrite<B> {
    /// One byte at a time, each followed by its read-back
    pub fn strict(data: B) -> Self {
        Self::new(data, false)
    }

    /// Pushes and drains interleaved
    pub fn pipelined(data: B) -> Self {
        Self::new(data, true)
    }

    fn new(data: B, pipelined: bool) -> Self {
        Self {
            data,
            pushed: 0,
            drained: 0,
            pipelined,
            state: ExchangeState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Bytes pushed so far
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Inbound bytes drained so far
    pub fn drained(&self) -> usize {
        self.drained
    }

    /// Advance until the peripheral blocks or the write completes
    pub fn poll<P: SlavePort + ?Sized>(&mut self, port: &mut P) -> Poll<()> {
        let len = self.data.byte_len();
        loop {
            match self.state {
                ExchangeState::Idle => {
                    self.state = if len == 0 {
                        ExchangeState::Drained
                    } else {
                        ExchangeState::WritableWait
                    };
                }
                ExchangeState::WritableWait => {
                    if !port.is_writable() {
                        return Poll::Pending;
                    }
                    port.write_data(self.data.byte_at(self.pushed));
                    self.pushed += 1;
                    self.state = ExchangeState::Written;
                }
                ExchangeState::Written => {
                    if self.pipelined {
                        if self.drained < self.pushed && port.is_readable() {
                            port.read_data();
                            self.drained += 1;
                        }
                        self.state = if self.pushed < len {
                            ExchangeState::WritableWait
                        } else {
                            ExchangeState::ReadableWait
                        };
                    } else {
                        self.state = ExchangeState::ReadableWait;
                    }
                }
                ExchangeState::ReadableWait => {
                    if self.drained == len {
                        self.state = ExchangeState::Drained;
                        continue;
                    }
                    if !port.is_readable() {
                        return Poll::Pending;
                    }
                    port.read_data();
                    self.drained += 1;
                    if !self.pipelined && self.pushed < len {
                        self.state = ExchangeState::WritableWait;
                    }
                }
                ExchangeState::Drained => return Poll::Ready(()),
            }
        }
    }
}

/// Blocking byte primitives on an SPI slave peripheral
pub struct SlaveExchange<P> {
    port: P,
}

impl<P: SlavePort> SlaveExchange<P> {
    /// Take ownership of the peripheral
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Access the peripheral
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Release the peripheral
    pub fn into_inner(self) -> P {
        self.port
    }

    /// Read a byte if one is waiting
    pub fn try_read_byte(&mut self) -> Option<u8> {
        if self.port.is_readable() {
            Some(self.port.read_data())
        } else {
            None
        }
    }

    /// Spin until a byte arrives and return it
    pub fn read_byte_blocking(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.try_read_byte() {
                return byte;
            }
            core::hint::spin_loop();
        }
    }

    /// Push one byte and discard the byte clocked in with it
    pub fn write_byte_blocking(&mut self, byte: u8) {
        self.run(SlaveWrite::strict([byte]));
    }

    /// Push `data` with pipelined read-back draining
    ///
    /// Returns once every byte has been clocked out and exactly
    /// `data.len()` inbound bytes have been drained.
    pub fn write_bytes_blocking(&mut self, data: &[u8]) {
        self.run(SlaveWrite::pipelined(data));
    }

    /// Push 32-bit words most significant byte first
    pub fn write_words_blocking(&mut self, words: &[u32]) {
        self.run(SlaveWrite::pipelined(BeWords(words)));
    }

    /// Spin a write to completion
    pub fn run<B: ByteSource>(&mut self, mut write: SlaveWrite<B>) {
        while write.poll(&mut self.port).is_pending() {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPort;

    #[test]
    fn test_read_byte() {
        let mut port = ScriptedPort::new(8);
        port.master_sends(&[0x42]);
        let mut exchange = SlaveExchange::new(port);
        assert_eq!(exchange.read_byte_blocking(), 0x42);
        assert_eq!(exchange.try_read_byte(), None);
    }

    #[test]
    fn test_write_byte_drains_read_back() {
        let mut port = ScriptedPort::new(8);
        port.master_sends(&[0x00]);
        let mut exchange = SlaveExchange::new(port);
        exchange.write_byte_blocking(0x99);
        assert_eq!(exchange.port_mut().master_received(), &[0x99]);
        assert_eq!(exchange.port_mut().rx_level(), 0);
    }

    #[test]
    fn test_strict_state_sequence() {
        let mut port = ScriptedPort::new(8);
        let mut write = SlaveWrite::strict([0x10u8]);
        assert_eq!(write.state(), ExchangeState::Idle);

        // nothing clocked yet: byte queued, waiting for the read-back
        assert!(write.poll(&mut port).is_pending());
        assert_eq!(write.state(), ExchangeState::ReadableWait);
        assert_eq!(write.pushed(), 1);

        port.master_sends(&[0xFF]);
        assert!(write.poll(&mut port).is_ready());
        assert_eq!(write.state(), ExchangeState::Drained);
        assert_eq!(port.master_received(), &[0x10]);
    }

    #[test]
    fn test_write_bytes_pipelined() {
        let data: [u8; 32] = core::array::from_fn(|i| i as u8 + 1);
        let mut port = ScriptedPort::new(8);
        port.master_sends(&[0u8; 32]);
        let mut exchange = SlaveExchange::new(port);
        exchange.write_bytes_blocking(&data);

        let port = exchange.into_inner();
        assert_eq!(port.master_received(), &data[..]);
        assert_eq!(port.rx_level(), 0);
    }

    #[test]
    fn test_pipelined_waits_for_every_read_back() {
        let mut port = ScriptedPort::new(4);
        let mut write = SlaveWrite::pipelined([1u8, 2, 3]);
        assert!(write.poll(&mut port).is_pending());
        assert_eq!(write.pushed(), 3);
        assert_eq!(write.drained(), 0);

        port.master_sends(&[0, 0]);
        assert!(write.poll(&mut port).is_pending());
        assert_eq!(write.drained(), 2);

        port.master_sends(&[0]);
        assert!(write.poll(&mut port).is_ready());
        assert_eq!(port.master_received(), &[1, 2, 3]);
    }

    #[test]
    fn test_words_most_significant_first() {
        let mut port = ScriptedPort::new(8);
        port.master_sends(&[0u8; 8]);
        let mut exchange = SlaveExchange::new(port);
        exchange.write_words_blocking(&[0x1122_3344, 0xAABB_CCDD]);
        assert_eq!(
            exchange.port_mut().master_received(),
            &[0x11, 0x22, 0x33, 0x44, 0xAA, 0xBB, 0xCC, 0xDD]
        );
    }
}
