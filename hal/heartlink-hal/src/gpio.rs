//! GPIO pin abstractions
//!
//! Logic levels as seen by port-level code. Pins are
//! configured through the chip's direction and output registers rather
//! than through per-pin driver objects.

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level
    pub fn flipped(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_flip() {
        assert_eq!(Level::Low.flipped(), Level::High);
        assert_eq!(Level::High.flipped(), Level::Low);
        assert_eq!(Level::Low.flipped().flipped(), Level::Low);
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
    }
}
