//! Heartlink - UART/SPI bridge firmware
//!
//! Main firmware binary for ATmega2560 boards (Arduino Mega 2560).
//! Brings up port B, Timer1, USART0 and the SPI controller from the
//! board.toml compiled into the image, hands the heartbeat LED to the
//! Timer1 compare-match interrupt, then idles in the foreground.

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use core::cell::RefCell;

use critical_section::Mutex;
use panic_halt as _;

use heartlink_core::{initialize, run, Bridge, Heartbeat, Idle, ValidatedConfig};
use heartlink_hal_avr::{Mmio, MmioFamily, Peripherals, PortPin};

mod board {
    include!(concat!(env!("OUT_DIR"), "/board.rs"));
}

/// Board configuration, checked again at compile time
const CONFIG: ValidatedConfig = match board::CONFIG.validate() {
    Ok(config) => config,
    Err(_) => panic!("board.toml produced an invalid configuration"),
};

/// Heartbeat owned by the compare-match interrupt once installed
static HEARTBEAT: Mutex<RefCell<Option<Heartbeat<Mmio<PortPin>>>>> =
    Mutex::new(RefCell::new(None));

#[avr_device::entry]
fn main() -> ! {
    // Only fails if something already took the peripherals
    let Some(peripherals) = Peripherals::<MmioFamily>::take() else {
        #[allow(clippy::empty_loop)]
        loop {}
    };

    let Bridge {
        heartbeat,
        uart,
        spi,
    } = initialize(peripherals, &CONFIG);

    critical_section::with(|cs| {
        HEARTBEAT.borrow(cs).replace(Some(heartbeat));
    });

    // SAFETY: everything the interrupt touches is installed above
    unsafe { avr_device::interrupt::enable() };

    run(uart, spi, Idle)
}

#[avr_device::interrupt(atmega2560)]
fn TIMER1_COMPA() {
    critical_section::with(|cs| {
        if let Some(heartbeat) = HEARTBEAT.borrow_ref_mut(cs).as_mut() {
            heartbeat.on_compare_match();
        }
    });
}
