//! Single-byte command protocol between host and device
//!
//! The host sends one opcode frame, then clocks out a fixed-length response
//! with dummy frames. There is no framing, length prefix or checksum: the
//! response length is implied by the opcode.
//!
//! | Command         | Default opcode | Response                       |
//! |-----------------|----------------|--------------------------------|
//! | `Nop`           | `0x00`         | none                           |
//! | `ResetCounters` | `0x01`         | none                           |
//! | `ReadClock`     | `0x02`         | 4 bytes, µs counter, LSB first |
//! | `ResetDevice`   | `0x03`         | none, device reboots           |
//! | `ReadData`      | `0x04`         | 32 bytes                       |
//!
//! Dummy frames clocked by the host are zero, so opcode `0x00` must stay a
//! harmless no-op: the device sees every dummy as a command.

/// Length of the `ReadData` response
pub const DATA_LEN: usize = 32;

/// Length of the `ReadClock` response
pub const CLOCK_LEN: usize = 4;

/// Data block served by default: `1, 2, ..., 32`
pub const DEFAULT_DATA: [u8; DATA_LEN] = {
    let mut data = [0u8; DATA_LEN];
    let mut i = 0;
    while i < DATA_LEN {
        data[i] = i as u8 + 1;
        i += 1;
    }
    data
};

/// A decoded command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Does nothing; also what dummy frames decode to
    Nop,
    /// Reset the device's counters
    ResetCounters,
    /// Report the device's free-running microsecond counter
    ReadClock,
    /// Reboot the device
    ResetDevice,
    /// Report the 32-byte data block
    ReadData,
    /// Byte matching no known opcode
    Unknown(u8),
}

/// What the device sends back after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseShape {
    /// Nothing
    None,
    /// Fixed number of bytes
    Bytes(usize),
    /// The device stops answering
    NoReturn,
}

impl Command {
    /// Response that follows this command
    pub const fn response(self) -> ResponseShape {
        match self {
            Self::ReadClock => ResponseShape::Bytes(CLOCK_LEN),
            Self::ReadData => ResponseShape::Bytes(DATA_LEN),
            Self::ResetDevice => ResponseShape::NoReturn,
            Self::Nop | Self::ResetCounters | Self::Unknown(_) => ResponseShape::None,
        }
    }

    /// Number of response bytes the host must clock out (0 if none)
    pub const fn response_len(self) -> usize {
        match self.response() {
            ResponseShape::Bytes(n) => n,
            ResponseShape::None | ResponseShape::NoReturn => 0,
        }
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::ResetCounters => "reset-counters",
            Self::ReadClock => "read-clock",
            Self::ResetDevice => "reset-device",
            Self::ReadData => "read-data",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unknown(byte) => write!(f, "unknown ({:#04x})", byte),
            other => f.write_str(other.name()),
        }
    }
}

/// Opcode assignment shared by host and device
///
/// Both ends must use the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandTable {
    /// Opcode of [`Command::Nop`]
    pub nop: u8,
    /// Opcode of [`Command::ResetCounters`]
    pub reset_counters: u8,
    /// Opcode of [`Command::ReadClock`]
    pub read_clock: u8,
    /// Opcode of [`Command::ResetDevice`]
    pub reset_device: u8,
    /// Opcode of [`Command::ReadData`]
    pub read_data: u8,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            nop: 0x00,
            reset_counters: 0x01,
            read_clock: 0x02,
            reset_device: 0x03,
            read_data: 0x04,
        }
    }
}

impl CommandTable {
    /// Decode a received byte
    pub fn classify(&self, byte: u8) -> Command {
        // first match wins if two commands share an opcode
        if byte == self.nop {
            Command::Nop
        } else if byte == self.reset_counters {
            Command::ResetCounters
        } else if byte == self.read_clock {
            Command::ReadClock
        } else if byte == self.reset_device {
            Command::ResetDevice
        } else if byte == self.read_data {
            Command::ReadData
        } else {
            Command::Unknown(byte)
        }
    }

    /// Opcode for a command; `Unknown` carries its own byte
    pub fn opcode(&self, command: Command) -> u8 {
        match command {
            Command::Nop => self.nop,
            Command::ResetCounters => self.reset_counters,
            Command::ReadClock => self.read_clock,
            Command::ResetDevice => self.reset_device,
            Command::ReadData => self.read_data,
            Command::Unknown(byte) => byte,
        }
    }
}

/// Decode a `ReadClock` response
pub fn decode_clock(bytes: [u8; CLOCK_LEN]) -> u32 {
    u32::from_le_bytes(bytes)
}
