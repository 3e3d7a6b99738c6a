//! SSI controller configuration

use crate::regs::*;

/// Default baud divisor: 200 MHz clk_sys / 20 = 10 MHz
pub const DEFAULT_CLOCK_DIVIDER: u16 = 20;

/// RP1 SSI reference clock in Hz
pub const RP1_CLK_SYS_HZ: u32 = 200_000_000;

/// SPI clock mode (CPOL/CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    #[default]
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Mode from its number (0-3)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::Mode0),
            1 => Some(Self::Mode1),
            2 => Some(Self::Mode2),
            3 => Some(Self::Mode3),
            _ => None,
        }
    }

    /// CTRLR0 SCPOL/SCPHA bits for this mode
    pub const fn ctrlr0_bits(self) -> u32 {
        match self {
            Self::Mode0 => 0,
            Self::Mode1 => CTRLR0_SCPHA,
            Self::Mode2 => CTRLR0_SCPOL,
            Self::Mode3 => CTRLR0_SCPOL | CTRLR0_SCPHA,
        }
    }
}

/// Width of one shift-register transfer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSize {
    /// 8-bit frames
    #[default]
    Bits8,
    /// 32-bit frames
    Bits32,
}

impl FrameSize {
    /// Number of bits per frame
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits32 => 32,
        }
    }

    /// Number of bytes per frame
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Mask covering one frame
    pub const fn mask(self) -> u32 {
        match self {
            Self::Bits8 => 0xff,
            Self::Bits32 => 0xffff_ffff,
        }
    }
}

/// Configuration applied to an SSI instance before use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    /// Divisor of clk_sys (BAUDR); the core only honours even values
    pub clock_divider: u16,
    /// Clock polarity/phase
    pub mode: SpiMode,
    /// Frame width
    pub frame: FrameSize,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            clock_divider: DEFAULT_CLOCK_DIVIDER,
            mode: SpiMode::default(),
            frame: FrameSize::default(),
        }
    }
}

impl SpiConfig {
    /// Set the clock divider
    pub fn with_divider(mut self, divider: u16) -> Self {
        self.clock_divider = divider;
        self
    }

    /// Set the SPI mode
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the frame width
    pub fn with_frame(mut self, frame: FrameSize) -> Self {
        self.frame = frame;
        self
    }

    /// Resulting SPI clock in Hz
    pub fn clock_hz(&self) -> u32 {
        RP1_CLK_SYS_HZ / u32::from(self.clock_divider.max(1))
    }

    /// CTRLR0 value for this configuration: Motorola SPI, transmit and receive
    pub fn ctrlr0(&self) -> u32 {
        let base = (CTRLR0_FRF_MOTO_SPI << CTRLR0_FRF_OFF)
            | (CTRLR0_TMOD_TR << CTRLR0_TMOD_OFF)
            | self.mode.ctrlr0_bits();
        ctrlr0_with_frame_bits(base, self.frame.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpiConfig::default();
        assert_eq!(config.clock_hz(), 10_000_000);
        assert_eq!(config.ctrlr0() & CTRLR0_MODE_MASK, CTRLR0_SCPHA);
        assert_eq!(ctrlr0_frame_bits(config.ctrlr0()), 8);
        assert_eq!(config.ctrlr0() & CTRLR0_TMOD_MASK, 0);
    }

    #[test]
    fn test_mode_bits() {
        assert_eq!(SpiMode::from_number(3), Some(SpiMode::Mode3));
        assert_eq!(SpiMode::from_number(4), None);
        assert_eq!(
            SpiMode::Mode3.ctrlr0_bits(),
            CTRLR0_SCPOL | CTRLR0_SCPHA
        );
    }

    #[test]
    fn test_wide_frames() {
        let config = SpiConfig::default()
            .with_frame(FrameSize::Bits32)
            .with_mode(SpiMode::Mode0);
        assert_eq!(ctrlr0_frame_bits(config.ctrlr0()), 32);
        assert_eq!(config.ctrlr0() & CTRLR0_MODE_MASK, 0);
        assert_eq!(FrameSize::Bits32.bytes(), 4);
        assert_eq!(FrameSize::Bits8.bytes(), 1);
    }

    #[test]
    fn test_divider_sets_clock() {
        let config = SpiConfig::default().with_divider(40);
        assert_eq!(config.clock_divider, 40);
        assert_eq!(config.clock_hz(), 5_000_000);
    }
}
