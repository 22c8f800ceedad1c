//! Idle loop
//!
//! After initialization the foreground does nothing but call into an
//! [`Application`] forever. The bridge itself defines no protocol; the
//! application decides what the bytes mean and drives the primitives.

use heartlink_hal::RegisterFamily;

use crate::transfer::{Spi, Uart};

/// Application logic run from the idle loop
pub trait Application<F: RegisterFamily> {
    /// One pass of the idle loop
    ///
    /// May block in the transfer primitives; the heartbeat keeps running.
    fn poll(&mut self, uart: &mut Uart<F>, spi: &mut Spi<F>);
}

/// Application that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl<F: RegisterFamily> Application<F> for Idle {
    fn poll(&mut self, _uart: &mut Uart<F>, _spi: &mut Spi<F>) {}
}

/// Run the idle loop forever
pub fn run<F: RegisterFamily, A: Application<F>>(
    mut uart: Uart<F>,
    mut spi: Spi<F>,
    mut app: A,
) -> ! {
    loop {
        app.poll(&mut uart, &mut spi);
    }
}
