//! RP1 peripheral window
//!
//! All RP1 peripherals sit behind PCI BAR1. Each 16 KiB peripheral block has
//! atomic aliases: a write at `+0x1000` XORs, `+0x2000` sets and `+0x3000`
//! clears the written bits, with no read-modify-write on the CPU side.

use rp1spi_core::{Register, RegisterFile, SpiInstance};

use crate::error::{Result, Rp1Error};
use crate::options::HostOptions;
use crate::physmap::PhysMap;

/// Physical address of RP1 PCI BAR1
pub const RP1_BAR1: u64 = 0x1f_0000_0000;

/// Length of RP1 PCI BAR1
pub const RP1_BAR1_LEN: usize = 0x40_0000;

/// XOR alias offset
pub const RP1_ATOM_XOR_OFFSET: usize = 0x1000;
/// Set alias offset
pub const RP1_ATOM_SET_OFFSET: usize = 0x2000;
/// Clear alias offset
pub const RP1_ATOM_CLR_OFFSET: usize = 0x3000;

/// IO_BANK0 (GPIO status/control) offset in BAR1
pub const RP1_IO_BANK0_BASE: usize = 0x0d_0000;

/// GPIO control register FUNCSEL field
pub const GPIO_CTRL_FUNCSEL_MASK: u32 = 0x1f;

/// FUNCSEL value routing GPIO 8..=11 to SPI0
pub const GPIO_FUNCSEL_SPI0: u32 = 0x00;

/// SPI0 pins on the 40-pin header: CE0, MISO, MOSI, SCLK
pub const SPI0_PINS: [u8; 4] = [8, 9, 10, 11];

/// SSI block offsets in BAR1, indexed by instance number
pub const SPI_BASES: [usize; 9] = [
    0x05_0000, // SPI0
    0x05_4000, // SPI1
    0x05_8000, // SPI2
    0x05_c000, // SPI3
    0x06_0000, // SPI4
    0x06_4000, // SPI5
    0x06_8000, // SPI6, not on GPIO
    0x06_c000, // SPI7, not on GPIO
    0x04_c000, // SPI8, not on GPIO
];

/// Highest instance routed to the GPIO header
pub const MAX_GPIO_INSTANCE: u8 = 5;

/// Offset of SSI instance `instance` in BAR1
///
/// Instances 6 to 8 exist but cannot reach the header and are rejected.
pub fn spi_base(instance: u8) -> Result<usize> {
    let base = *SPI_BASES
        .get(usize::from(instance))
        .ok_or(Rp1Error::InvalidInstance(instance))?;
    if instance > MAX_GPIO_INSTANCE {
        return Err(Rp1Error::InstanceUnavailable(instance));
    }
    Ok(base)
}

/// Mapped RP1 peripheral window
pub struct Rp1 {
    map: PhysMap,
}

impl Rp1 {
    /// Map BAR1 through `/dev/mem` (requires root)
    pub fn map() -> Result<Self> {
        let map = PhysMap::new(RP1_BAR1, RP1_BAR1_LEN)?;
        log::info!("RP1 BAR1 mapped at {:#x}", RP1_BAR1);
        Ok(Self { map })
    }

    /// Register file of SSI instance `instance`
    pub fn spi(&self, instance: u8) -> Result<MmioRegisters<'_>> {
        let base = spi_base(instance)?;
        log::debug!("SPI{} registers at BAR1 + {:#x}", instance, base);
        Ok(MmioRegisters {
            map: &self.map,
            base,
        })
    }

    /// Route pins if asked, then hand out a configured SSI instance
    pub fn open_spi(&self, opts: &HostOptions) -> Result<SpiInstance<MmioRegisters<'_>>> {
        let regs = self.spi(opts.instance)?;
        let mut spi = SpiInstance::new(regs);
        log::debug!("SPI{} before configuration:\n{}", opts.instance, spi.snapshot());

        if opts.select_pins && opts.instance == 0 {
            self.select_spi0_pins();
        }
        spi.configure(&opts.config)?;
        Ok(spi)
    }

    /// Set the FUNCSEL field of GPIO `pin`
    pub fn set_pin_function(&self, pin: u8, funcsel: u32) {
        // each pin has a status word followed by a control word
        let ctrl = RP1_IO_BANK0_BASE + 8 * usize::from(pin) + 4;
        self.map
            .write32(ctrl + RP1_ATOM_CLR_OFFSET, GPIO_CTRL_FUNCSEL_MASK);
        self.map
            .write32(ctrl + RP1_ATOM_SET_OFFSET, funcsel & GPIO_CTRL_FUNCSEL_MASK);
    }

    /// Route GPIO 8..=11 to SPI0
    pub fn select_spi0_pins(&self) {
        for pin in SPI0_PINS {
            self.set_pin_function(pin, GPIO_FUNCSEL_SPI0);
        }
        log::debug!("GPIO {:?} routed to SPI0", SPI0_PINS);
    }
}

/// One SSI instance's registers inside the mapped window
pub struct MmioRegisters<'a> {
    map: &'a PhysMap,
    base: usize,
}

impl RegisterFile for MmioRegisters<'_> {
    #[inline]
    fn read(&mut self, reg: Register) -> u32 {
        self.map.read32(self.base + reg.offset())
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u32) {
        self.map.write32(self.base + reg.offset(), value)
    }

    fn set_bits(&mut self, reg: Register, mask: u32) {
        self.map
            .write32(self.base + RP1_ATOM_SET_OFFSET + reg.offset(), mask)
    }

    fn clear_bits(&mut self, reg: Register, mask: u32) {
        self.map
            .write32(self.base + RP1_ATOM_CLR_OFFSET + reg.offset(), mask)
    }
}
