//! Peripheral register set
//!
//! [`Peripherals`] is the single owned handle to every register the bridge
//! uses, grouped per peripheral. It is generic over the register family so
//! host tests can build one from mock registers.

use core::cell::Cell;

use critical_section::Mutex;
use heartlink_hal::RegisterFamily;

use crate::bits::{DataBit, Spcr, Spsr, Tccr1b, Timsk1, Ucsr0a, Ucsr0b, Ucsr0c};
use crate::mmio::{Mmio, Mmio16, MmioFamily};
use crate::pins::PortPin;
use crate::regs;

/// Port B output and direction registers
pub struct PortB<F: RegisterFamily> {
    /// Output latch (PORTB)
    pub port: F::Reg<PortPin>,
    /// Data direction (DDRB, 1 = output)
    pub ddr: F::Reg<PortPin>,
}

/// Timer/Counter1 registers used for the compare-match tick
pub struct Timer1<F: RegisterFamily> {
    pub tccr1b: F::Reg<Tccr1b>,
    pub ocr1a: F::Wide,
    pub timsk1: F::Reg<Timsk1>,
}

/// USART0 registers
pub struct Usart0<F: RegisterFamily> {
    pub ucsr0a: F::Reg<Ucsr0a>,
    pub ucsr0b: F::Reg<Ucsr0b>,
    pub ucsr0c: F::Reg<Ucsr0c>,
    pub ubrr0: F::Wide,
    pub udr0: F::Reg<DataBit>,
}

/// SPI registers
pub struct Spi<F: RegisterFamily> {
    pub spcr: F::Reg<Spcr>,
    pub spsr: F::Reg<Spsr>,
    pub spdr: F::Reg<DataBit>,
}

/// Every register the bridge touches
pub struct Peripherals<F: RegisterFamily> {
    pub portb: PortB<F>,
    pub timer1: Timer1<F>,
    pub usart0: Usart0<F>,
    pub spi: Spi<F>,
}

static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

impl Peripherals<MmioFamily> {
    /// Take the hardware peripheral set
    ///
    /// Returns `Some` exactly once per reset.
    pub fn take() -> Option<Self> {
        critical_section::with(|cs| {
            let taken = TAKEN.borrow(cs);
            if taken.get() {
                None
            } else {
                taken.set(true);
                // SAFETY: guarded by TAKEN, so these are the only handles
                Some(unsafe { Self::steal() })
            }
        })
    }

    /// Create the hardware peripheral set unconditionally
    ///
    /// # Safety
    ///
    /// Must not be used while another `Peripherals<MmioFamily>` is alive.
    pub unsafe fn steal() -> Self {
        Self {
            portb: PortB {
                port: Mmio::new(regs::PORTB),
                ddr: Mmio::new(regs::DDRB),
            },
            timer1: Timer1 {
                tccr1b: Mmio::new(regs::TCCR1B),
                ocr1a: Mmio16::new(regs::OCR1AL),
                timsk1: Mmio::new(regs::TIMSK1),
            },
            usart0: Usart0 {
                ucsr0a: Mmio::new(regs::UCSR0A),
                ucsr0b: Mmio::new(regs::UCSR0B),
                ucsr0c: Mmio::new(regs::UCSR0C),
                ubrr0: Mmio16::new(regs::UBRR0L),
                udr0: Mmio::new(regs::UDR0),
            },
            spi: Spi {
                spcr: Mmio::new(regs::SPCR),
                spsr: Mmio::new(regs::SPSR),
                spdr: Mmio::new(regs::SPDR),
            },
        }
    }
}
