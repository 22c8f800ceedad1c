//! SPI controller configuration types
//!
//! The bridge only ever acts as the bus controller (master), so the
//! configuration covers clocking and mode but not role selection.

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Serial clock as a division of the CPU clock
    pub clock: ClockDivider,
    /// Clock polarity and phase
    pub mode: Mode,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            clock: ClockDivider::Div16,
            mode: Mode::Mode0,
        }
    }
}

/// SPI clock divider relative to the CPU clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivider {
    Div4,
    Div16,
    Div64,
    Div128,
}

impl ClockDivider {
    /// Division factor
    pub const fn factor(self) -> u32 {
        match self {
            ClockDivider::Div4 => 4,
            ClockDivider::Div16 => 16,
            ClockDivider::Div64 => 64,
            ClockDivider::Div128 => 128,
        }
    }

    /// Divider for a numeric factor, if supported
    pub const fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            4 => Some(ClockDivider::Div4),
            16 => Some(ClockDivider::Div16),
            64 => Some(ClockDivider::Div64),
            128 => Some(ClockDivider::Div128),
            _ => None,
        }
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Mode for a numeric mode number, if valid
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Mode::Mode0),
            1 => Some(Mode::Mode1),
            2 => Some(Mode::Mode2),
            3 => Some(Mode::Mode3),
            _ => None,
        }
    }
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divider_factor_lookup() {
        assert_eq!(ClockDivider::from_factor(16), Some(ClockDivider::Div16));
        assert_eq!(ClockDivider::from_factor(8), None);
        assert_eq!(ClockDivider::Div128.factor(), 128);
    }

    #[test]
    fn test_mode_split() {
        let (pol, pha): (Polarity, Phase) = Mode::Mode3.into();
        assert_eq!(pol, Polarity::IdleHigh);
        assert_eq!(pha, Phase::CaptureOnSecondTransition);
        assert_eq!(Mode::from_number(4), None);
    }
}
