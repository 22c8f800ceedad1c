//! Heartbeat indicator
//!
//! The heartbeat line is toggled once per Timer1 compare match. After
//! initialization the [`Heartbeat`] owns the port output register, so no
//! other code can write the line.
//!
//! # Interrupt contract
//!
//! [`Heartbeat::on_compare_match`] runs in interrupt context. It runs to
//! completion, is never re-entered (the compare source is a single timer),
//! and preempts the foreground loop. It must not block, allocate, or call
//! any of the UART/SPI primitives. Anything added here has to keep that
//! contract, or the tick it is driven by will drift.
//!
//! A stalled transfer in the foreground leaves the LED blinking, which is
//! the intended "alive but stuck" signal.

use heartlink_hal::{Level, Register};
use heartlink_hal_avr::PortPin;

/// Heartbeat state machine (LED high / LED low)
pub struct Heartbeat<R> {
    port: R,
    line: PortPin,
    toggles: u32,
}

impl<R: Register<PortPin>> Heartbeat<R> {
    /// Take ownership of the port register for the given line
    pub fn new(port: R, line: PortPin) -> Self {
        Self {
            port,
            line,
            toggles: 0,
        }
    }

    /// Compare-match handler body: flip the heartbeat line
    #[inline]
    pub fn on_compare_match(&mut self) {
        self.port.toggle_bit(self.line);
        self.toggles = self.toggles.wrapping_add(1);
    }

    /// Current level of the heartbeat line
    pub fn level(&self) -> Level {
        Level::from(self.port.is_set(self.line))
    }

    /// Handler invocations since initialization (wrapping)
    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    /// The line being driven
    pub fn line(&self) -> PortPin {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{names, Access, MockBus};

    #[test]
    fn test_toggle_flips_only_heartbeat_bit() {
        let bus = MockBus::new();
        bus.set(names::PORTB, 0b0000_0101);
        let mut heartbeat = Heartbeat::new(bus.register(names::PORTB), PortPin::Pb7);

        heartbeat.on_compare_match();
        assert_eq!(bus.value(names::PORTB), 0b1000_0101);
        assert_eq!(heartbeat.level(), Level::High);

        heartbeat.on_compare_match();
        assert_eq!(bus.value(names::PORTB), 0b0000_0101);
        assert_eq!(heartbeat.level(), Level::Low);
    }

    #[test]
    fn test_n_invocations_n_flips() {
        let bus = MockBus::new();
        let mut heartbeat = Heartbeat::new(bus.register(names::PORTB), PortPin::Pb7);

        let mut last = heartbeat.level();
        bus.clear_log();
        for _ in 0..7 {
            heartbeat.on_compare_match();
            let now = heartbeat.level();
            assert_eq!(now, last.flipped());
            last = now;
        }

        assert_eq!(heartbeat.toggles(), 7);
        assert_eq!(bus.writes(names::PORTB).len(), 7);
        // PORTB is the only register touched
        assert!(bus.log().iter().all(|access| matches!(
            access,
            Access::Read(names::PORTB, _) | Access::Write(names::PORTB, _)
        )));
    }

    #[test]
    fn test_counter_wraps() {
        let bus = MockBus::new();
        let mut heartbeat = Heartbeat::new(bus.register(names::PORTB), PortPin::Pb5);
        heartbeat.toggles = u32::MAX;
        heartbeat.on_compare_match();
        assert_eq!(heartbeat.toggles(), 0);
        assert_eq!(heartbeat.line(), PortPin::Pb5);
    }
}
