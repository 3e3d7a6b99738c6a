//! DesignWare APB SSI register definitions
//!
//! Register offsets and bit fields for the Synopsys DW_apb_ssi core as
//! instantiated in the RP1 I/O controller (IP version 4.02a). Offsets are
//! relative to the base of one SSI instance and are 4-byte aligned.
//!
//! The masks here must match the silicon exactly; they are shared by the
//! MMIO register file on the host and by the simulator.

use bitflags::bitflags;

/// Named SSI registers
///
/// The discriminant of each variant is its byte offset from the instance base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Register {
    /// Control register 0 (frame size, format, clock polarity/phase, transfer mode)
    Ctrlr0 = 0x00,
    /// Control register 1 (number of data frames)
    Ctrlr1 = 0x04,
    /// SSI enable
    Ssienr = 0x08,
    /// Microwire control (unused in SPI mode)
    Mwcr = 0x0c,
    /// Slave enable (chip select lines)
    Ser = 0x10,
    /// Baud rate divisor of clk_sys
    Baudr = 0x14,
    /// Transmit FIFO threshold level
    Txftlr = 0x18,
    /// Receive FIFO threshold level
    Rxftlr = 0x1c,
    /// Transmit FIFO level
    Txflr = 0x20,
    /// Receive FIFO level
    Rxflr = 0x24,
    /// Status
    Sr = 0x28,
    /// Interrupt mask
    Imr = 0x2c,
    /// Interrupt status
    Isr = 0x30,
    /// Raw interrupt status
    Risr = 0x34,
    /// Transmit FIFO overflow interrupt clear
    Txoicr = 0x38,
    /// Receive FIFO overflow interrupt clear
    Rxoicr = 0x3c,
    /// Receive FIFO underflow interrupt clear
    Rxuicr = 0x40,
    /// Multi-master interrupt clear
    Msticr = 0x44,
    /// Combined interrupt clear (cleared on read)
    Icr = 0x48,
    /// DMA control
    Dmacr = 0x4c,
    /// DMA transmit data level
    Dmatdlr = 0x50,
    /// DMA receive data level
    Dmardlr = 0x54,
    /// Identification
    Idr = 0x58,
    /// Component version
    Version = 0x5c,
    /// Data register (FIFO window)
    Dr = 0x60,
    /// Receive sample delay
    RxSampleDly = 0xf0,
    /// Chip select override
    CsOverride = 0xf4,
}

impl Register {
    /// Number of named registers
    pub const COUNT: usize = 27;

    /// All registers in offset order
    pub const ALL: [Register; Register::COUNT] = [
        Register::Ctrlr0,
        Register::Ctrlr1,
        Register::Ssienr,
        Register::Mwcr,
        Register::Ser,
        Register::Baudr,
        Register::Txftlr,
        Register::Rxftlr,
        Register::Txflr,
        Register::Rxflr,
        Register::Sr,
        Register::Imr,
        Register::Isr,
        Register::Risr,
        Register::Txoicr,
        Register::Rxoicr,
        Register::Rxuicr,
        Register::Msticr,
        Register::Icr,
        Register::Dmacr,
        Register::Dmatdlr,
        Register::Dmardlr,
        Register::Idr,
        Register::Version,
        Register::Dr,
        Register::RxSampleDly,
        Register::CsOverride,
    ];

    /// Byte offset from the instance base
    #[inline]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Register lookup by byte offset
    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.offset() == offset)
    }

    /// Datasheet mnemonic
    pub const fn name(self) -> &'static str {
        match self {
            Register::Ctrlr0 => "CTRLR0",
            Register::Ctrlr1 => "CTRLR1",
            Register::Ssienr => "SSIENR",
            Register::Mwcr => "MWCR",
            Register::Ser => "SER",
            Register::Baudr => "BAUDR",
            Register::Txftlr => "TXFTLR",
            Register::Rxftlr => "RXFTLR",
            Register::Txflr => "TXFLR",
            Register::Rxflr => "RXFLR",
            Register::Sr => "SR",
            Register::Imr => "IMR",
            Register::Isr => "ISR",
            Register::Risr => "RISR",
            Register::Txoicr => "TXOICR",
            Register::Rxoicr => "RXOICR",
            Register::Rxuicr => "RXUICR",
            Register::Msticr => "MSTICR",
            Register::Icr => "ICR",
            Register::Dmacr => "DMACR",
            Register::Dmatdlr => "DMATDLR",
            Register::Dmardlr => "DMARDLR",
            Register::Idr => "IDR",
            Register::Version => "VERSION",
            Register::Dr => "DR",
            Register::RxSampleDly => "RX_SAMPLE_DLY",
            Register::CsOverride => "CS_OVERRIDE",
        }
    }

    /// True if reading this register has side effects (FIFO pop or interrupt clear)
    pub const fn read_has_side_effects(self) -> bool {
        matches!(
            self,
            Register::Dr
                | Register::Icr
                | Register::Txoicr
                | Register::Rxoicr
                | Register::Rxuicr
                | Register::Msticr
        )
    }
}

// ============================================================================
// CTRLR0 (APB variant)
// ============================================================================

/// Data frame size, 4-bit field (frame bits - 1)
pub const CTRLR0_DFS_OFF: u32 = 0;
/// Data frame size field
pub const CTRLR0_DFS_MASK: u32 = 0xf << CTRLR0_DFS_OFF;
/// Frame format
pub const CTRLR0_FRF_OFF: u32 = 4;
/// Frame format field
pub const CTRLR0_FRF_MASK: u32 = 0x3 << CTRLR0_FRF_OFF;
/// Motorola SPI
pub const CTRLR0_FRF_MOTO_SPI: u32 = 0x0;
/// TI synchronous serial
pub const CTRLR0_FRF_TI_SSP: u32 = 0x1;
/// National Semiconductor Microwire
pub const CTRLR0_FRF_NS_MICROWIRE: u32 = 0x2;
/// Serial clock phase and polarity together
pub const CTRLR0_MODE_OFF: u32 = 6;
/// SCPHA and SCPOL together
pub const CTRLR0_MODE_MASK: u32 = 0x3 << CTRLR0_MODE_OFF;
/// Serial clock phase
pub const CTRLR0_SCPHA: u32 = 1 << 6;
/// Serial clock polarity
pub const CTRLR0_SCPOL: u32 = 1 << 7;
/// Transfer mode
pub const CTRLR0_TMOD_OFF: u32 = 8;
/// Transfer mode field
pub const CTRLR0_TMOD_MASK: u32 = 0x3 << CTRLR0_TMOD_OFF;
/// Transmit and receive
pub const CTRLR0_TMOD_TR: u32 = 0x0;
/// Transmit only
pub const CTRLR0_TMOD_TO: u32 = 0x1;
/// Receive only
pub const CTRLR0_TMOD_RO: u32 = 0x2;
/// EEPROM read
pub const CTRLR0_TMOD_EPROMREAD: u32 = 0x3;
/// Slave output enable
pub const CTRLR0_SLV_OE: u32 = 1 << 10;
/// Shift register loop (test mode)
pub const CTRLR0_SRL: u32 = 1 << 11;
/// Control frame size (Microwire)
pub const CTRLR0_CFS: u32 = 1 << 12;
/// Data frame size for 32-bit capable cores, 5-bit field (frame bits - 1)
pub const CTRLR0_DFS32_OFF: u32 = 16;
/// 32-bit data frame size field
pub const CTRLR0_DFS32_MASK: u32 = 0x1f << CTRLR0_DFS32_OFF;

// ============================================================================
// CTRLR1
// ============================================================================

/// Number of data frames
pub const CTRLR1_NDF_MASK: u32 = 0xffff;

// ============================================================================
// SSIENR / SER
// ============================================================================

/// SSI enable bit
pub const SSIENR_ENABLE: u32 = 1 << 0;
/// Chip select 0
pub const SER_CS0: u32 = 1 << 0;

bitflags! {
    /// Status register (SR) flags
    ///
    /// Sampled fresh on every poll; a stale copy would lose frames.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// Transfer in progress
        const BUSY = 1 << 0;
        /// Transmit FIFO not full
        const TF_NOT_FULL = 1 << 1;
        /// Transmit FIFO empty
        const TF_EMPTY = 1 << 2;
        /// Receive FIFO not empty
        const RF_NOT_EMPTY = 1 << 3;
        /// Receive FIFO full
        const RF_FULL = 1 << 4;
        /// Transmission error
        const TX_ERR = 1 << 5;
        /// Data collision
        const DCOL = 1 << 6;
    }
}

impl Status {
    /// Mask of the defined SR bits
    pub const MASK: u32 = 0x7f;

    /// True once a received frame can be read and the shifter has stopped
    #[inline]
    pub fn read_back_ready(self) -> bool {
        self.contains(Self::RF_NOT_EMPTY) && !self.contains(Self::BUSY)
    }
}

bitflags! {
    /// Interrupt bits shared by IMR, ISR and RISR
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interrupts: u32 {
        /// Transmit FIFO empty
        const TXEI = 1 << 0;
        /// Transmit FIFO overflow
        const TXOI = 1 << 1;
        /// Receive FIFO underflow
        const RXUI = 1 << 2;
        /// Receive FIFO overflow
        const RXOI = 1 << 3;
        /// Receive FIFO full
        const RXFI = 1 << 4;
        /// Multi-master contention
        const MSTI = 1 << 5;
    }
}

bitflags! {
    /// DMA control register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DmaControl: u32 {
        /// Receive DMA enable
        const RDMAE = 1 << 0;
        /// Transmit DMA enable
        const TDMAE = 1 << 1;
    }
}

/// Extract the 32-bit-core frame size in bits from a CTRLR0 value
#[inline]
pub fn ctrlr0_frame_bits(ctrlr0: u32) -> u32 {
    ((ctrlr0 & CTRLR0_DFS32_MASK) >> CTRLR0_DFS32_OFF) + 1
}

/// Replace the frame size field of a CTRLR0 value
#[inline]
pub fn ctrlr0_with_frame_bits(ctrlr0: u32, bits: u32) -> u32 {
    debug_assert!((4..=32).contains(&bits));
    (ctrlr0 & !CTRLR0_DFS32_MASK) | (((bits - 1) << CTRLR0_DFS32_OFF) & CTRLR0_DFS32_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_match_layout() {
        assert_eq!(Register::Sr.offset(), 0x28);
        assert_eq!(Register::Dr.offset(), 0x60);
        assert_eq!(Register::CsOverride.offset(), 0xf4);
        assert_eq!(Register::from_offset(0x10), Some(Register::Ser));
        assert_eq!(Register::from_offset(0x64), None);
    }

    #[test]
    fn test_frame_size_field() {
        let ctrlr0 = CTRLR0_SCPHA | (7 << CTRLR0_DFS32_OFF);
        assert_eq!(ctrlr0_frame_bits(ctrlr0), 8);

        let wide = ctrlr0_with_frame_bits(ctrlr0, 32);
        assert_eq!(wide & CTRLR0_DFS32_MASK, CTRLR0_DFS32_MASK);
        assert_eq!(wide & CTRLR0_SCPHA, CTRLR0_SCPHA);
        assert_eq!(ctrlr0_frame_bits(wide), 32);
    }

    #[test]
    fn test_read_back_ready() {
        assert!(Status::RF_NOT_EMPTY.read_back_ready());
        assert!(!(Status::RF_NOT_EMPTY | Status::BUSY).read_back_ready());
        assert!(!Status::TF_EMPTY.read_back_ready());
    }
}
