//! Compile-time configuration
//!
//! The bridge has no runtime configuration surface. A [`BridgeConfig`] is
//! built from constants, checked once by [`BridgeConfig::validate`] (in a
//! `const` context in the firmware) and the resulting [`ValidatedConfig`]
//! carries the register values the initializer writes.

use core::fmt;

use heartlink_hal::spi::{ClockDivider, Mode, SpiConfig};
use heartlink_hal::uart::UartConfig;
use heartlink_hal::Patience;
use heartlink_hal_avr::pins::{self, PortPin};
use heartlink_hal_avr::regs::UBRR0_MAX;

/// UART clock ticks per bit in normal (not double) speed mode
pub const UART_SAMPLES_PER_BIT: u32 = 16;

/// Default reference clock (Arduino Mega 2560 crystal)
pub const DEFAULT_CLOCK_HZ: u32 = 16_000_000;

/// Default heartbeat flash frequency
pub const DEFAULT_FLASH_HZ: u32 = 1;

/// Default UART baud rate
pub const DEFAULT_BAUD: u32 = 9_600;

/// Default tolerated baud rate error (2.5%)
///
/// Wide enough for 57600 baud on a 16 MHz clock (divisor 16, 2.1% fast).
pub const DEFAULT_MAX_BAUD_ERROR_PERMILLE: u16 = 25;

/// Timer1 clock pre-scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    /// Division factor
    pub const fn factor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Pre-scaler for a numeric factor, if the timer supports it
    pub const fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            1 => Some(Prescaler::Div1),
            8 => Some(Prescaler::Div8),
            64 => Some(Prescaler::Div64),
            256 => Some(Prescaler::Div256),
            1024 => Some(Prescaler::Div1024),
            _ => None,
        }
    }
}

/// How the flash frequency maps onto compare-match events
///
/// Each compare match toggles the heartbeat line once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToggleConvention {
    /// One toggle per flash period: compare fires at `flash_hz`, so the
    /// LED changes state `flash_hz` times a second and completes a full
    /// on/off cycle at `flash_hz / 2`.
    PerFlash,
    /// Two toggles per flash period: compare fires at `2 * flash_hz`, so
    /// the LED completes a full on/off cycle at `flash_hz`.
    PerHalfFlash,
}

impl ToggleConvention {
    /// Compare-match events per flash period
    pub const fn toggles_per_flash(self) -> u32 {
        match self {
            ToggleConvention::PerFlash => 1,
            ToggleConvention::PerHalfFlash => 2,
        }
    }

    /// Convention for a toggles-per-flash count, if supported
    pub const fn from_toggles(toggles: u32) -> Option<Self> {
        match toggles {
            1 => Some(ToggleConvention::PerFlash),
            2 => Some(ToggleConvention::PerHalfFlash),
            _ => None,
        }
    }
}

/// Configuration rejected during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Reference clock is zero
    ZeroClock,
    /// Heartbeat flash frequency is zero
    ZeroFlashFrequency,
    /// Compare-match rate overflowed or came out as zero
    ZeroToggleRate,
    /// UART baud rate is zero
    ZeroBaud,
    /// Compare threshold does not fit the 16-bit OCR1A register
    CompareThresholdOverflow,
    /// Compare rate is faster than the pre-scaled timer clock
    CompareThresholdTooSmall,
    /// Baud divisor does not fit the 12-bit UBRR0 register
    BaudDivisorOverflow,
    /// Baud rate is faster than the UART can generate
    BaudTooHigh,
    /// Achievable baud rate is too far from the requested one
    BaudErrorTooLarge,
    /// Heartbeat line collides with an SPI line
    HeartbeatOnSpiPin,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroClock => "clock frequency must be non-zero",
            ConfigError::ZeroFlashFrequency => "flash frequency must be non-zero",
            ConfigError::ZeroToggleRate => "compare-match rate is out of range",
            ConfigError::ZeroBaud => "baud rate must be non-zero",
            ConfigError::CompareThresholdOverflow => "compare threshold exceeds 16 bits",
            ConfigError::CompareThresholdTooSmall => {
                "flash frequency too high for the timer pre-scaler"
            }
            ConfigError::BaudDivisorOverflow => "baud divisor exceeds 12 bits",
            ConfigError::BaudTooHigh => "baud rate too high for the clock",
            ConfigError::BaudErrorTooLarge => "achievable baud rate deviates too far",
            ConfigError::HeartbeatOnSpiPin => "heartbeat pin is used by SPI",
        };
        f.write_str(msg)
    }
}

/// Timer1 compare threshold for a compare-match rate
///
/// `(clock_hz / prescaler / compare_hz) - 1`, in integer arithmetic.
pub const fn compare_threshold(
    clock_hz: u32,
    prescaler: Prescaler,
    compare_hz: u32,
) -> Result<u16, ConfigError> {
    if clock_hz == 0 {
        return Err(ConfigError::ZeroClock);
    }
    if compare_hz == 0 {
        return Err(ConfigError::ZeroToggleRate);
    }

    let ticks = clock_hz / prescaler.factor() / compare_hz;
    if ticks == 0 {
        return Err(ConfigError::CompareThresholdTooSmall);
    }

    let threshold = ticks - 1;
    if threshold > u16::MAX as u32 {
        return Err(ConfigError::CompareThresholdOverflow);
    }
    Ok(threshold as u16)
}

/// UBRR0 divisor for a baud rate in normal speed mode
///
/// `(clock_hz / (baud * 16)) - 1`, in integer arithmetic.
pub const fn baud_divisor(clock_hz: u32, baud: u32) -> Result<u16, ConfigError> {
    if clock_hz == 0 {
        return Err(ConfigError::ZeroClock);
    }
    if baud == 0 {
        return Err(ConfigError::ZeroBaud);
    }

    let bit_clock = match baud.checked_mul(UART_SAMPLES_PER_BIT) {
        Some(v) => v,
        None => return Err(ConfigError::BaudTooHigh),
    };

    let quotient = clock_hz / bit_clock;
    if quotient == 0 {
        return Err(ConfigError::BaudTooHigh);
    }

    let divisor = quotient - 1;
    if divisor > UBRR0_MAX as u32 {
        return Err(ConfigError::BaudDivisorOverflow);
    }
    Ok(divisor as u16)
}

/// Baud rate the UART actually produces for a divisor
pub const fn actual_baud(clock_hz: u32, divisor: u16) -> u32 {
    clock_hz / (UART_SAMPLES_PER_BIT * (divisor as u32 + 1))
}

/// Deviation of `actual` from `target` in parts per thousand, rounded down
pub const fn baud_error_permille(target: u32, actual: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    let diff = if actual > target {
        actual - target
    } else {
        target - actual
    };
    ((diff as u64 * 1000) / target as u64) as u32
}

/// Board configuration as supplied at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Reference clock frequency (Hz)
    pub clock_hz: u32,
    /// Heartbeat flash frequency (Hz)
    pub flash_hz: u32,
    /// Compare-match events per flash period
    pub toggle: ToggleConvention,
    /// Timer1 clock pre-scaler
    pub prescaler: Prescaler,
    /// Port B line driving the heartbeat LED
    pub heartbeat_pin: PortPin,
    /// UART rate and frame format
    pub uart: UartConfig,
    /// Largest tolerated baud error, or `None` to accept any
    pub max_baud_error_permille: Option<u16>,
    /// SPI clock and mode
    pub spi: SpiConfig,
    /// Busy-poll limit used by the `embedded-io` / `embedded-hal` impls
    pub patience: Patience,
}

impl BridgeConfig {
    /// Configuration with the given rates and defaults for everything else
    ///
    /// Defaults: 256x pre-scale, one toggle per flash period, heartbeat on
    /// PB7, 8N1 frame, 2.5% baud tolerance, SPI at fck/16 in mode 0, and no
    /// poll limit.
    pub const fn new(clock_hz: u32, flash_hz: u32, baud: u32) -> Self {
        Self {
            clock_hz,
            flash_hz,
            toggle: ToggleConvention::PerFlash,
            prescaler: Prescaler::Div256,
            heartbeat_pin: pins::HEARTBEAT,
            uart: UartConfig::eight_n_one(baud),
            max_baud_error_permille: Some(DEFAULT_MAX_BAUD_ERROR_PERMILLE),
            spi: SpiConfig {
                clock: ClockDivider::Div16,
                mode: Mode::Mode0,
            },
            patience: Patience::Forever,
        }
    }

    /// Rate at which Timer1 must raise compare-match events
    pub const fn compare_hz(&self) -> Option<u32> {
        self.flash_hz.checked_mul(self.toggle.toggles_per_flash())
    }

    /// Check the configuration and derive register values
    pub const fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if self.flash_hz == 0 {
            return Err(ConfigError::ZeroFlashFrequency);
        }
        if self.heartbeat_pin.is_spi() {
            return Err(ConfigError::HeartbeatOnSpiPin);
        }

        let compare_hz = match self.compare_hz() {
            Some(hz) => hz,
            None => return Err(ConfigError::ZeroToggleRate),
        };
        let compare_threshold = match compare_threshold(self.clock_hz, self.prescaler, compare_hz)
        {
            Ok(v) => v,
            Err(e) => return Err(e),
        };

        let baud_divisor = match baud_divisor(self.clock_hz, self.uart.baudrate) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        if let Some(max) = self.max_baud_error_permille {
            let actual = actual_baud(self.clock_hz, baud_divisor);
            if baud_error_permille(self.uart.baudrate, actual) > max as u32 {
                return Err(ConfigError::BaudErrorTooLarge);
            }
        }

        Ok(ValidatedConfig {
            config: self,
            compare_threshold,
            baud_divisor,
        })
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_HZ, DEFAULT_FLASH_HZ, DEFAULT_BAUD)
    }
}

/// Configuration that passed validation, with derived register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidatedConfig {
    config: BridgeConfig,
    compare_threshold: u16,
    baud_divisor: u16,
}

impl ValidatedConfig {
    /// The configuration this was derived from
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Value for OCR1A
    pub const fn compare_threshold(&self) -> u16 {
        self.compare_threshold
    }

    /// Value for UBRR0
    pub const fn baud_divisor(&self) -> u16 {
        self.baud_divisor
    }

    /// Baud rate the UART will actually run at
    pub const fn actual_baud(&self) -> u32 {
        actual_baud(self.config.clock_hz, self.baud_divisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartlink_hal::uart::{DataBits, Parity};
    use proptest::prelude::*;

    #[test]
    fn test_reference_compare_threshold() {
        assert_eq!(
            compare_threshold(16_000_000, Prescaler::Div256, 1),
            Ok(62_499)
        );
    }

    #[test]
    fn test_reference_baud_divisor() {
        assert_eq!(baud_divisor(16_000_000, 9_600), Ok(103));
        assert_eq!(actual_baud(16_000_000, 103), 9_615);
        assert_eq!(baud_error_permille(9_600, 9_615), 1);
    }

    #[test]
    fn test_default_config_validates() {
        let validated = BridgeConfig::default().validate().unwrap();
        assert_eq!(validated.compare_threshold(), 62_499);
        assert_eq!(validated.baud_divisor(), 103);
        assert_eq!(validated.config().heartbeat_pin, PortPin::Pb7);
        assert_eq!(validated.config().uart.data_bits, DataBits::Eight);
        assert_eq!(validated.config().uart.parity, Parity::None);
    }

    #[test]
    fn test_validate_in_const_context() {
        const VALIDATED: ValidatedConfig = match BridgeConfig::new(16_000_000, 1, 9_600).validate()
        {
            Ok(v) => v,
            Err(_) => panic!("reference configuration must validate"),
        };
        assert_eq!(VALIDATED.compare_threshold(), 62_499);
    }

    #[test]
    fn test_half_flash_doubles_rate() {
        let mut config = BridgeConfig::default();
        config.toggle = ToggleConvention::PerHalfFlash;
        let validated = config.validate().unwrap();
        assert_eq!(validated.compare_threshold(), 31_249);
    }

    #[test]
    fn test_threshold_overflow() {
        // 16 MHz / 64 at 1 Hz needs 250_000 ticks
        assert_eq!(
            compare_threshold(16_000_000, Prescaler::Div64, 1),
            Err(ConfigError::CompareThresholdOverflow)
        );
    }

    #[test]
    fn test_threshold_too_small() {
        assert_eq!(
            compare_threshold(16_000_000, Prescaler::Div1024, 20_000),
            Err(ConfigError::CompareThresholdTooSmall)
        );
    }

    #[test]
    fn test_zero_inputs_rejected() {
        assert_eq!(
            BridgeConfig::new(0, 1, 9_600).validate(),
            Err(ConfigError::ZeroClock)
        );
        assert_eq!(
            BridgeConfig::new(16_000_000, 0, 9_600).validate(),
            Err(ConfigError::ZeroFlashFrequency)
        );
        assert_eq!(
            BridgeConfig::new(16_000_000, 1, 0).validate(),
            Err(ConfigError::ZeroBaud)
        );
    }

    #[test]
    fn test_baud_limits() {
        assert_eq!(
            baud_divisor(16_000_000, 2_000_000),
            Err(ConfigError::BaudTooHigh)
        );
        assert_eq!(baud_divisor(16_000_000, u32::MAX), Err(ConfigError::BaudTooHigh));
        // 16 MHz / (16 * 200) - 1 = 4999 > 4095
        assert_eq!(
            baud_divisor(16_000_000, 200),
            Err(ConfigError::BaudDivisorOverflow)
        );
    }

    #[test]
    fn test_baud_error_tolerance() {
        // 115200 at 16 MHz lands on 125000 (8.5% off)
        let strict = BridgeConfig::new(16_000_000, 1, 115_200);
        assert_eq!(strict.validate(), Err(ConfigError::BaudErrorTooLarge));

        let mut lenient = strict;
        lenient.max_baud_error_permille = None;
        assert_eq!(lenient.validate().unwrap().actual_baud(), 125_000);
    }

    #[test]
    fn test_57600_baud_within_default_tolerance() {
        let validated = BridgeConfig::new(16_000_000, 1, 57_600).validate().unwrap();
        assert_eq!(validated.baud_divisor(), 16);
        // 16 MHz / (16 * 17) = 58823
        assert_eq!(validated.actual_baud(), 58_823);
        assert_eq!(baud_error_permille(57_600, 58_823), 21);
    }

    #[test]
    fn test_heartbeat_on_spi_pin_rejected() {
        let mut config = BridgeConfig::default();
        config.heartbeat_pin = PortPin::Pb1;
        assert_eq!(config.validate(), Err(ConfigError::HeartbeatOnSpiPin));
    }

    #[test]
    fn test_prescaler_and_toggle_lookup() {
        assert_eq!(Prescaler::from_factor(256), Some(Prescaler::Div256));
        assert_eq!(Prescaler::from_factor(128), None);
        assert_eq!(
            ToggleConvention::from_toggles(2),
            Some(ToggleConvention::PerHalfFlash)
        );
        assert_eq!(ToggleConvention::from_toggles(3), None);
    }

    proptest! {
        #[test]
        fn prop_threshold_matches_direct_division(
            clock in 1_000_000u32..=20_000_000,
            flash in 1u32..=100,
        ) {
            let expected = (clock / 256) / flash;
            match compare_threshold(clock, Prescaler::Div256, flash) {
                Ok(threshold) => prop_assert_eq!(threshold as u32, expected - 1),
                Err(ConfigError::CompareThresholdTooSmall) => prop_assert_eq!(expected, 0),
                Err(ConfigError::CompareThresholdOverflow) => {
                    prop_assert!(expected - 1 > u16::MAX as u32)
                }
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
        }

        #[test]
        fn prop_threshold_fits_for_legal_range(
            clock in 1_000_000u32..=16_000_000,
            flash in 1u32..=60,
        ) {
            // 256x pre-scale keeps 1 Hz at <= 16 MHz within 16 bits
            let threshold = compare_threshold(clock, Prescaler::Div256, flash);
            prop_assert!(threshold.is_ok());
        }

        #[test]
        fn prop_baud_divisor_matches_formula(
            clock in 1_000_000u32..=20_000_000,
            baud in 300u32..=250_000,
        ) {
            let quotient = clock / (16 * baud);
            match baud_divisor(clock, baud) {
                Ok(divisor) => prop_assert_eq!(divisor as u32, quotient - 1),
                Err(ConfigError::BaudTooHigh) => prop_assert_eq!(quotient, 0),
                Err(ConfigError::BaudDivisorOverflow) => {
                    prop_assert!(quotient - 1 > UBRR0_MAX as u32)
                }
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
        }
    }
}
