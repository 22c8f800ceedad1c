//! End-to-end scenarios on the mock register file

use heartlink_hal::Level;

use crate::config::BridgeConfig;
use crate::init::initialize;
use crate::mock::{names, Access, MockBus};

const UDRE0: u16 = 0x20;

fn boot(bus: &MockBus) -> crate::init::Bridge<crate::mock::MockFamily> {
    let config = BridgeConfig::new(16_000_000, 1, 9_600).validate().unwrap();
    initialize(bus.peripherals(), &config)
}

#[test]
fn test_reference_board_programs_expected_dividers() {
    let bus = MockBus::new();
    let _bridge = boot(&bus);

    assert_eq!(bus.writes(names::OCR1A), [62_499]);
    assert_eq!(bus.writes(names::UBRR0), [103]);
}

#[test]
fn test_two_ticks_restore_heartbeat_level() {
    let bus = MockBus::new();
    let mut bridge = boot(&bus);
    let start = bridge.heartbeat.level();
    let port_before = bus.value(names::PORTB);

    bridge.heartbeat.on_compare_match();
    assert_eq!(bridge.heartbeat.level(), start.flipped());
    bridge.heartbeat.on_compare_match();

    assert_eq!(bridge.heartbeat.level(), start);
    assert_eq!(bus.value(names::PORTB), port_before);
}

#[test]
fn test_send_after_one_poll_cycle() {
    let bus = MockBus::new();
    let mut bridge = boot(&bus);
    bus.clear_log();

    bus.script(names::UCSR0A, &[0, UDRE0]);
    bridge.uart.send_uart_byte(0x41);

    assert_eq!(
        bus.log(),
        [
            Access::Read(names::UCSR0A, 0),
            Access::Read(names::UCSR0A, UDRE0),
            Access::Write(names::UDR0, 0x41),
        ]
    );
}

#[test]
fn test_ticks_between_transfers_stay_on_port() {
    let bus = MockBus::new();
    let mut bridge = boot(&bus);
    bus.clear_log();

    bus.script(names::UCSR0A, &[UDRE0]);
    bridge.uart.send_uart_byte(b'x');
    bridge.heartbeat.on_compare_match();
    bus.script(names::SPSR, &[0x80]);
    bridge.spi.send_spi_byte(b'y');
    bridge.heartbeat.on_compare_match();

    let foreign = bus
        .log()
        .into_iter()
        .filter(|access| {
            matches!(
                access,
                Access::Write(names::PORTB, _)
                    | Access::Write(names::DDRB, _)
                    | Access::Write(names::TCCR1B, _)
                    | Access::Write(names::OCR1A, _)
                    | Access::Write(names::TIMSK1, _)
            )
        })
        .count();
    // Only the two heartbeat toggles touch PORTB; nothing reconfigures
    assert_eq!(foreign, 2);
    assert_eq!(bridge.heartbeat.toggles(), 2);
    assert_eq!(bridge.heartbeat.level(), Level::Low);
}
