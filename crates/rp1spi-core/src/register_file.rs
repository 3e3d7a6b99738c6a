//! Register file abstraction
//!
//! The transaction engines never touch raw pointers. They talk to an SSI
//! instance through [`RegisterFile`], which maps a logical [`Register`] to a
//! 32-bit access. The MMIO implementation lives in the host crate, the
//! simulated one in the simulator crate.

use core::fmt;

use crate::regs::{Register, Status};

/// Read/write access to the named registers of one SSI instance
pub trait RegisterFile {
    /// Read a register
    ///
    /// Takes `&mut self` because some reads (DR, the interrupt clear
    /// registers) change hardware state.
    fn read(&mut self, reg: Register) -> u32;

    /// Write a register
    fn write(&mut self, reg: Register, value: u32);

    /// Set the bits of `mask` in a register
    ///
    /// The default is a read-modify-write. Implementations with an atomic
    /// set alias should override it.
    fn set_bits(&mut self, reg: Register, mask: u32) {
        let value = self.read(reg);
        self.write(reg, value | mask);
    }

    /// Clear the bits of `mask` in a register
    fn clear_bits(&mut self, reg: Register, mask: u32) {
        let value = self.read(reg);
        self.write(reg, value & !mask);
    }

    /// Sample the status register
    #[inline]
    fn status(&mut self) -> Status {
        Status::from_bits_truncate(self.read(Register::Sr))
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &mut T {
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }

    fn set_bits(&mut self, reg: Register, mask: u32) {
        (**self).set_bits(reg, mask)
    }

    fn clear_bits(&mut self, reg: Register, mask: u32) {
        (**self).clear_bits(reg, mask)
    }
}

/// Values of every side-effect-free register at one instant
///
/// Registers whose read pops a FIFO or clears interrupts are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    values: [Option<u32>; Register::COUNT],
}

impl RegisterSnapshot {
    /// Read all safe registers
    pub fn capture<R: RegisterFile + ?Sized>(regs: &mut R) -> Self {
        let mut values = [None; Register::COUNT];
        for (slot, reg) in values.iter_mut().zip(Register::ALL) {
            if !reg.read_has_side_effects() {
                *slot = Some(regs.read(reg));
            }
        }
        Self { values }
    }

    /// Captured value of a register, `None` if it was skipped
    pub fn get(&self, reg: Register) -> Option<u32> {
        Register::ALL
            .iter()
            .position(|r| *r == reg)
            .and_then(|i| self.values[i])
    }

    /// Decoded status register
    pub fn status(&self) -> Status {
        Status::from_bits_truncate(self.get(Register::Sr).unwrap_or(0))
    }
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (reg, value) in Register::ALL.iter().zip(self.values.iter()) {
            if let Some(value) = value {
                writeln!(f, "{:#04x} {:<12} {:#010x}", reg.offset(), reg.name(), value)?;
            }
        }
        write!(f, "status: {:?}", self.status())
    }
}
