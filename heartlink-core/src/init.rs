//! One-shot peripheral initialization
//!
//! [`initialize`] consumes the peripheral set, brings GPIO, Timer1, USART0
//! and SPI into their working state, and hands back the parts the rest of
//! the system is allowed to keep. It must run before interrupts are
//! enabled. Direction and timer registers are not returned, so nothing can
//! reconfigure them afterwards.

use heartlink_hal::register::mask_of;
use heartlink_hal::spi::{ClockDivider, Phase, Polarity, SpiConfig};
use heartlink_hal::uart::{DataBits, Parity, StopBits, UartConfig};
use heartlink_hal::{BitPosition, Register, RegisterFamily, WideRegister};
use heartlink_hal_avr::bits::{Spcr, Tccr1b, Timsk1, Ucsr0a, Ucsr0b, Ucsr0c};
use heartlink_hal_avr::peripherals::{PortB, Spi as SpiRegs, Timer1, Usart0};
use heartlink_hal_avr::pins::{PortPin, SPI_PINS};
use heartlink_hal_avr::Peripherals;

use crate::config::{Prescaler, ValidatedConfig};
use crate::heartbeat::Heartbeat;
use crate::transfer::{Spi, Uart};

/// Initialized system, split by owner
pub struct Bridge<F: RegisterFamily> {
    /// Goes to the compare-match interrupt
    pub heartbeat: Heartbeat<F::Reg<PortPin>>,
    /// Stays in the foreground
    pub uart: Uart<F>,
    /// Stays in the foreground
    pub spi: Spi<F>,
}

/// Configure every peripheral the bridge uses
pub fn initialize<F: RegisterFamily>(
    peripherals: Peripherals<F>,
    config: &ValidatedConfig,
) -> Bridge<F> {
    let Peripherals {
        mut portb,
        mut timer1,
        mut usart0,
        mut spi,
    } = peripherals;
    let settings = config.config();

    configure_gpio(&mut portb, settings.heartbeat_pin);
    configure_timer(&mut timer1, settings.prescaler, config.compare_threshold());
    configure_uart(&mut usart0, &settings.uart, config.baud_divisor());
    configure_spi(&mut spi, &settings.spi);

    #[cfg(feature = "defmt")]
    defmt::info!(
        "Peripherals initialized: OCR1A={}, UBRR0={} (~{} baud)",
        config.compare_threshold(),
        config.baud_divisor(),
        config.actual_baud()
    );

    Bridge {
        heartbeat: Heartbeat::new(portb.port, settings.heartbeat_pin),
        uart: Uart::new(usart0, settings.patience),
        spi: Spi::new(spi, settings.patience),
    }
}

/// Drive all outputs low, make everything an input, then enable the
/// heartbeat and SPI controller lines as outputs
///
/// SS must be a driven output even though it is not used as a select:
/// as an input, a low level on it would drop the SPI into peripheral mode.
pub fn configure_gpio<F: RegisterFamily>(portb: &mut PortB<F>, heartbeat: PortPin) {
    portb.port.write(0x00);
    portb.ddr.write(0x00);

    portb.ddr.set_bit(heartbeat);
    for pin in SPI_PINS {
        portb.ddr.set_bit(pin);
    }
}

/// Start Timer1 in clear-on-compare mode and enable the compare A interrupt
pub fn configure_timer<F: RegisterFamily>(
    timer1: &mut Timer1<F>,
    prescaler: Prescaler,
    threshold: u16,
) {
    timer1
        .tccr1b
        .write(prescaler_mask(prescaler) | Tccr1b::Wgm12.mask());
    timer1.ocr1a.write(threshold);
    timer1.timsk1.write_bits(&[Timsk1::Ocie1a]);

    #[cfg(feature = "defmt")]
    defmt::debug!("Timer1: prescaler {}, OCR1A {}", prescaler, threshold);
}

/// Set the baud divisor and frame format, then enable both directions
pub fn configure_uart<F: RegisterFamily>(usart0: &mut Usart0<F>, uart: &UartConfig, divisor: u16) {
    usart0.ubrr0.write(divisor);
    usart0.ucsr0a.clear_bit(Ucsr0a::U2x0);
    usart0.ucsr0c.write(frame_mask(uart));
    usart0.ucsr0b.set_bits(&[Ucsr0b::Rxen0, Ucsr0b::Txen0]);

    #[cfg(feature = "defmt")]
    defmt::debug!("USART0: UBRR0 {}, {}", divisor, uart);
}

/// Enable the SPI as bus controller
pub fn configure_spi<F: RegisterFamily>(spi: &mut SpiRegs<F>, config: &SpiConfig) {
    spi.spcr.write(spi_control_mask(config));

    #[cfg(feature = "defmt")]
    defmt::debug!("SPI: {}", config);
}

/// TCCR1B clock-select bits for a pre-scaler
pub fn prescaler_mask(prescaler: Prescaler) -> u8 {
    match prescaler {
        Prescaler::Div1 => mask_of(&[Tccr1b::Cs10]),
        Prescaler::Div8 => mask_of(&[Tccr1b::Cs11]),
        Prescaler::Div64 => mask_of(&[Tccr1b::Cs11, Tccr1b::Cs10]),
        Prescaler::Div256 => mask_of(&[Tccr1b::Cs12]),
        Prescaler::Div1024 => mask_of(&[Tccr1b::Cs12, Tccr1b::Cs10]),
    }
}

/// UCSR0C value for an asynchronous frame format
pub fn frame_mask(uart: &UartConfig) -> u8 {
    let data = match uart.data_bits {
        DataBits::Five => 0,
        DataBits::Six => mask_of(&[Ucsr0c::Ucsz00]),
        DataBits::Seven => mask_of(&[Ucsr0c::Ucsz01]),
        DataBits::Eight => mask_of(&[Ucsr0c::Ucsz01, Ucsr0c::Ucsz00]),
    };
    let parity = match uart.parity {
        Parity::None => 0,
        Parity::Even => mask_of(&[Ucsr0c::Upm01]),
        Parity::Odd => mask_of(&[Ucsr0c::Upm01, Ucsr0c::Upm00]),
    };
    let stop = match uart.stop_bits {
        StopBits::One => 0,
        StopBits::Two => mask_of(&[Ucsr0c::Usbs0]),
    };
    data | parity | stop
}

/// SPCR value for controller role with the given clock and mode
pub fn spi_control_mask(config: &SpiConfig) -> u8 {
    let clock = match config.clock {
        ClockDivider::Div4 => 0,
        ClockDivider::Div16 => mask_of(&[Spcr::Spr0]),
        ClockDivider::Div64 => mask_of(&[Spcr::Spr1]),
        ClockDivider::Div128 => mask_of(&[Spcr::Spr1, Spcr::Spr0]),
    };
    let (polarity, phase): (Polarity, Phase) = config.mode.into();
    let cpol = match polarity {
        Polarity::IdleLow => 0,
        Polarity::IdleHigh => mask_of(&[Spcr::Cpol]),
    };
    let cpha = match phase {
        Phase::CaptureOnFirstTransition => 0,
        Phase::CaptureOnSecondTransition => mask_of(&[Spcr::Cpha]),
    };
    mask_of(&[Spcr::Spe, Spcr::Mstr]) | clock | cpol | cpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::mock::{names, Access, MockBus};
    use heartlink_hal::spi::Mode;
    use heartlink_hal::Level;

    fn reference() -> ValidatedConfig {
        BridgeConfig::new(16_000_000, 1, 9_600).validate().unwrap()
    }

    #[test]
    fn test_reference_register_values() {
        let bus = MockBus::new();
        let _bridge = initialize(bus.peripherals(), &reference());

        assert_eq!(bus.value(names::PORTB), 0x00);
        // PB7 | PB2 | PB1 | PB0
        assert_eq!(bus.value(names::DDRB), 0b1000_0111);
        // CS12 | WGM12
        assert_eq!(bus.value(names::TCCR1B), 0x0C);
        assert_eq!(bus.value(names::OCR1A), 62_499);
        assert_eq!(bus.value(names::TIMSK1), 0x02);
        assert_eq!(bus.value(names::UBRR0), 103);
        // UCSZ01 | UCSZ00
        assert_eq!(bus.value(names::UCSR0C), 0x06);
        // RXEN0 | TXEN0
        assert_eq!(bus.value(names::UCSR0B), 0x18);
        // SPE | MSTR | SPR0
        assert_eq!(bus.value(names::SPCR), 0x51);
    }

    #[test]
    fn test_gpio_cleared_before_outputs_enabled() {
        let bus = MockBus::new();
        bus.set(names::PORTB, 0xFF);
        bus.set(names::DDRB, 0xFF);
        let _bridge = initialize(bus.peripherals(), &reference());

        assert_eq!(bus.writes(names::PORTB), [0x00]);
        let ddr = bus.writes(names::DDRB);
        assert_eq!(ddr[0], 0x00);
        assert_eq!(ddr.last().copied(), Some(0b1000_0111));
        // Port goes low before any line becomes an output
        let log = bus.log();
        assert_eq!(log[0], Access::Write(names::PORTB, 0x00));
    }

    #[test]
    fn test_double_speed_cleared() {
        let bus = MockBus::new();
        bus.set(names::UCSR0A, 0x02);
        let _bridge = initialize(bus.peripherals(), &reference());
        assert_eq!(bus.value(names::UCSR0A), 0x00);
    }

    #[test]
    fn test_heartbeat_starts_low() {
        let bus = MockBus::new();
        let bridge = initialize(bus.peripherals(), &reference());
        assert_eq!(bridge.heartbeat.level(), Level::Low);
        assert_eq!(bridge.heartbeat.line(), PortPin::Pb7);
    }

    #[test]
    fn test_prescaler_masks() {
        assert_eq!(prescaler_mask(Prescaler::Div1), 0x01);
        assert_eq!(prescaler_mask(Prescaler::Div8), 0x02);
        assert_eq!(prescaler_mask(Prescaler::Div64), 0x03);
        assert_eq!(prescaler_mask(Prescaler::Div256), 0x04);
        assert_eq!(prescaler_mask(Prescaler::Div1024), 0x05);
    }

    #[test]
    fn test_frame_masks() {
        assert_eq!(frame_mask(&UartConfig::eight_n_one(9_600)), 0x06);
        let seven_e_two = UartConfig {
            baudrate: 9_600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
        };
        assert_eq!(frame_mask(&seven_e_two), 0x2C);
        let five_o_one = UartConfig {
            data_bits: DataBits::Five,
            parity: Parity::Odd,
            stop_bits: StopBits::One,
            ..seven_e_two
        };
        assert_eq!(frame_mask(&five_o_one), 0x30);
    }

    #[test]
    fn test_spi_control_masks() {
        let mode3_div128 = SpiConfig {
            clock: ClockDivider::Div128,
            mode: Mode::Mode3,
        };
        assert_eq!(spi_control_mask(&mode3_div128), 0x5F);
        let mode0_div4 = SpiConfig {
            clock: ClockDivider::Div4,
            mode: Mode::Mode0,
        };
        assert_eq!(spi_control_mask(&mode0_div4), 0x50);
    }
}
