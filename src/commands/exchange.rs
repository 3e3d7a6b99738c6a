//! Opcode/response exchanges with the device

use std::time::Duration;

use rp1spi_core::deadline::Until;
use rp1spi_core::master::Frame;
use rp1spi_core::protocol::{decode_clock, CLOCK_LEN, DATA_LEN};
use rp1spi_core::{Command, CommandTable, Direction, RegisterFile, SpiInstance, TransferRequest};

use crate::error::HostError;

/// Send `opcode`, then read `buf.len()` frames of the width of `F`
///
/// Stray read-backs of the opcode are purged first. `timeout` bounds the
/// read only; `None` waits for the peer indefinitely.
pub fn exchange<R: RegisterFile, F: Frame>(
    spi: &mut SpiInstance<R>,
    opcode: u8,
    buf: &mut [F],
    timeout: Option<Duration>,
) -> Result<(), HostError> {
    let len = buf.len();
    spi.write_byte_blocking(opcode)
        .map_err(|source| HostError::Send { opcode, source })?;

    let purged = spi
        .purge_rx_fifo()
        .map_err(|source| HostError::Read { opcode, len, source })?;
    if purged > 0 {
        log::warn!("Dropped {} stray frames after opcode {:#04x}", purged, opcode);
    }

    if buf.is_empty() {
        return Ok(());
    }
    spi.transfer(TransferRequest {
        direction: Direction::ReadOnly,
        buf,
        deadline: timeout.map(Until::after),
    })
    .map_err(|source| HostError::Read { opcode, len, source })
}

/// Send a command that has no response
pub fn send<R: RegisterFile>(
    spi: &mut SpiInstance<R>,
    table: &CommandTable,
    command: Command,
) -> Result<(), HostError> {
    let opcode = table.opcode(command);
    log::info!("Sending {} ({:#04x})", command, opcode);
    exchange::<R, u8>(spi, opcode, &mut [], None)
}

/// Read the device's microsecond counter
pub fn read_clock<R: RegisterFile>(
    spi: &mut SpiInstance<R>,
    table: &CommandTable,
    timeout: Option<Duration>,
) -> Result<u32, HostError> {
    let mut raw = [0u8; CLOCK_LEN];
    exchange(spi, table.opcode(Command::ReadClock), &mut raw, timeout)?;
    log::debug!("clock bytes: {:02x?}", raw);
    Ok(decode_clock(raw))
}

/// Read the device's data block
pub fn read_data<R: RegisterFile>(
    spi: &mut SpiInstance<R>,
    table: &CommandTable,
    timeout: Option<Duration>,
) -> Result<[u8; DATA_LEN], HostError> {
    let mut data = [0u8; DATA_LEN];
    exchange(spi, table.opcode(Command::ReadData), &mut data, timeout)?;
    Ok(data)
}
