//! Device-side command loop
//!
//! The dispatcher reads one opcode byte at a time and answers with the
//! fixed-size response the opcode implies. The watchdog is the only liveness
//! mechanism: [`CommandDispatcher::poll`] feeds it whenever no response is in
//! flight, so a response the host never clocks out eventually reboots the
//! device. The watchdog period itself is configured by whoever owns the
//! hardware.

use core::task::Poll;

use crate::protocol::{Command, CommandTable, CLOCK_LEN, DATA_LEN, DEFAULT_DATA};
use crate::slave::{SlaveExchange, SlavePort, SlaveWrite};

/// Free-running microsecond counter
pub trait MonotonicClock {
    /// Current counter value; wraps at `u32::MAX`
    fn now_us(&mut self) -> u32;
}

/// Hardware watchdog as seen by the dispatcher
pub trait Watchdog {
    /// Re-arm the timer for another full period
    fn feed(&mut self);

    /// Arrange a reset as soon as possible
    ///
    /// May return before the reset happens; the dispatcher stops feeding
    /// afterwards either way.
    fn force_reset(&mut self);
}

/// Response buffer large enough for any command
pub type Response = heapless::Vec<u8, DATA_LEN>;

/// What one [`CommandDispatcher::poll`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchEvent {
    /// No byte waiting and nothing in flight
    Idle,
    /// A command was received and fully answered
    Handled(Command),
    /// A response is still being clocked out
    Responding(Command),
    /// A device reset has been requested; nothing else will be processed
    ResetPending,
}

enum DispatchState {
    Idle,
    Responding {
        command: Command,
        write: SlaveWrite<Response>,
    },
    Resetting,
}

/// Opcode dispatcher on top of a [`SlaveExchange`]
pub struct CommandDispatcher<P, C, W> {
    exchange: SlaveExchange<P>,
    clock: C,
    watchdog: W,
    table: CommandTable,
    data: [u8; DATA_LEN],
    state: DispatchState,
}

impl<P: SlavePort, C: MonotonicClock, W: Watchdog> CommandDispatcher<P, C, W> {
    /// Dispatcher with the default opcode table and data block
    pub fn new(port: P, clock: C, watchdog: W) -> Self {
        Self {
            exchange: SlaveExchange::new(port),
            clock,
            watchdog,
            table: CommandTable::default(),
            data: DEFAULT_DATA,
            state: DispatchState::Idle,
        }
    }

    /// Use a different opcode table
    pub fn with_table(mut self, table: CommandTable) -> Self {
        self.table = table;
        self
    }

    /// Replace the block served by `ReadData`
    pub fn set_data(&mut self, data: [u8; DATA_LEN]) {
        self.data = data;
    }

    /// Access the byte exchange
    pub fn exchange_mut(&mut self) -> &mut SlaveExchange<P> {
        &mut self.exchange
    }

    /// Access the watchdog
    pub fn watchdog_mut(&mut self) -> &mut W {
        &mut self.watchdog
    }

    /// Run one iteration of the command loop
    ///
    /// Never blocks. Feeds the watchdog at the end of every iteration that
    /// leaves no response in flight.
    pub fn poll(&mut self) -> DispatchEvent {
        let event = match &mut self.state {
            DispatchState::Resetting => return DispatchEvent::ResetPending,
            DispatchState::Responding { command, write } => {
                let command = *command;
                if write.poll(self.exchange.port_mut()).is_ready() {
                    self.state = DispatchState::Idle;
                    DispatchEvent::Handled(command)
                } else {
                    DispatchEvent::Responding(command)
                }
            }
            DispatchState::Idle => match self.exchange.try_read_byte() {
                Some(byte) => self.dispatch(byte),
                None => DispatchEvent::Idle,
            },
        };

        if matches!(self.state, DispatchState::Idle) {
            self.watchdog.feed();
        }
        event
    }

    /// Run the command loop forever
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    fn dispatch(&mut self, byte: u8) -> DispatchEvent {
        let command = self.table.classify(byte);
        let response = match command {
            Command::Nop => {
                debug!("nop");
                None
            }
            Command::ResetCounters => {
                info!("reset counters");
                None
            }
            Command::ReadClock => {
                let now = self.clock.now_us();
                debug!("read clock: {} us", now);
                Some(Response::from_slice(&now.to_le_bytes()[..CLOCK_LEN]))
            }
            Command::ReadData => {
                debug!("read data");
                Some(Response::from_slice(&self.data))
            }
            Command::ResetDevice => {
                info!("device reset requested");
                self.watchdog.force_reset();
                self.state = DispatchState::Resetting;
                return DispatchEvent::ResetPending;
            }
            Command::Unknown(raw) => {
                warn!("unknown command byte {:#x}", raw);
                None
            }
        };

        // both responses fit in `Response`, so from_slice cannot fail here
        let Some(Ok(response)) = response else {
            return DispatchEvent::Handled(command);
        };

        let mut write = SlaveWrite::pipelined(response);
        if write.poll(self.exchange.port_mut()).is_ready() {
            return DispatchEvent::Handled(command);
        }
        self.state = DispatchState::Responding { command, write };
        DispatchEvent::Responding(command)
    }
}
