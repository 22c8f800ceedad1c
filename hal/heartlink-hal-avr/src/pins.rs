//! Port B pin assignments
//!
//! Arduino Mega 2560 wiring:
//!
//! | Pin | Function                          |
//! |-----|-----------------------------------|
//! | PB0 | SPI SS (driven, unused as select) |
//! | PB1 | SPI SCK                           |
//! | PB2 | SPI MOSI                          |
//! | PB3 | SPI MISO (input)                  |
//! | PB7 | Heartbeat LED ("L" on the board)  |
//!
//! USART0 uses PE0 (RXD0) and PE1 (TXD0); the USART overrides those pins
//! once enabled, so they need no direction setup.

use heartlink_hal::BitPosition;

/// Port B pin (PORTB / DDRB / PINB bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PortPin {
    Pb0 = 0,
    Pb1 = 1,
    Pb2 = 2,
    Pb3 = 3,
    Pb4 = 4,
    Pb5 = 5,
    Pb6 = 6,
    Pb7 = 7,
}

impl BitPosition for PortPin {
    fn index(self) -> u8 {
        self as u8
    }
}

impl PortPin {
    /// Pin for a bit number, if in range
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(PortPin::Pb0),
            1 => Some(PortPin::Pb1),
            2 => Some(PortPin::Pb2),
            3 => Some(PortPin::Pb3),
            4 => Some(PortPin::Pb4),
            5 => Some(PortPin::Pb5),
            6 => Some(PortPin::Pb6),
            7 => Some(PortPin::Pb7),
            _ => None,
        }
    }

    /// Check if the SPI controller claims this pin (PB0..=PB3)
    pub const fn is_spi(self) -> bool {
        matches!(
            self,
            PortPin::Pb0 | PortPin::Pb1 | PortPin::Pb2 | PortPin::Pb3
        )
    }
}

/// Default heartbeat indicator (on-board LED)
pub const HEARTBEAT: PortPin = PortPin::Pb7;
/// SPI select; must be a driven output to keep the controller in master role
pub const SPI_SS: PortPin = PortPin::Pb0;
/// SPI serial clock
pub const SPI_SCK: PortPin = PortPin::Pb1;
/// SPI controller data out
pub const SPI_MOSI: PortPin = PortPin::Pb2;
/// SPI controller data in
pub const SPI_MISO: PortPin = PortPin::Pb3;

/// SPI lines that must be outputs in controller role
pub const SPI_PINS: [PortPin; 3] = [SPI_SCK, SPI_MOSI, SPI_SS];

/// Parse a pin string from config
///
/// Supports formats:
/// - "PB7" -> Pb7
/// - "pb4" -> Pb4
///
/// Only port B is accepted, since the heartbeat shares its port with SPI.
pub fn parse_pin_string(s: &str) -> Option<PortPin> {
    let s = s.trim();
    let bytes = s.as_bytes();

    if bytes.len() != 3 {
        return None;
    }
    if !bytes[0].eq_ignore_ascii_case(&b'P') || !bytes[1].eq_ignore_ascii_case(&b'B') {
        return None;
    }
    if !bytes[2].is_ascii_digit() {
        return None;
    }

    PortPin::from_index(bytes[2] - b'0')
}
