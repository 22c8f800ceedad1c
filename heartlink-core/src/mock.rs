//! Recording register mock
//!
//! [`MockBus`] stands in for the register file on the host. Every access is
//! appended to an ordered log, and status registers can be scripted with
//! the values successive reads should return, so tests can check both what
//! was written and when it was written relative to the flags polled.

use core::cell::RefCell;
use core::marker::PhantomData;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

use heartlink_hal::{BitPosition, Register, RegisterFamily, WideRegister};
use heartlink_hal_avr::{Peripherals, PortB, Spi, Timer1, Usart0};

/// Register names used in the access log
pub mod names {
    pub const PORTB: &str = "PORTB";
    pub const DDRB: &str = "DDRB";
    pub const TCCR1B: &str = "TCCR1B";
    pub const OCR1A: &str = "OCR1A";
    pub const TIMSK1: &str = "TIMSK1";
    pub const UCSR0A: &str = "UCSR0A";
    pub const UCSR0B: &str = "UCSR0B";
    pub const UCSR0C: &str = "UCSR0C";
    pub const UBRR0: &str = "UBRR0";
    pub const UDR0: &str = "UDR0";
    pub const SPCR: &str = "SPCR";
    pub const SPSR: &str = "SPSR";
    pub const SPDR: &str = "SPDR";
}

/// One register access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(&'static str, u16),
    Write(&'static str, u16),
}

#[derive(Default)]
struct Slot {
    value: u16,
    script: VecDeque<u16>,
}

#[derive(Default)]
struct BusState {
    slots: BTreeMap<&'static str, Slot>,
    log: Vec<Access>,
}

/// Shared register file for a set of mock registers
#[derive(Clone, Default)]
pub struct MockBus {
    state: Rc<RefCell<BusState>>,
}

impl MockBus {
    /// Create an empty bus; every register reads as zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a full peripheral set backed by this bus
    pub fn peripherals(&self) -> Peripherals<MockFamily> {
        Peripherals {
            portb: PortB {
                port: self.register(names::PORTB),
                ddr: self.register(names::DDRB),
            },
            timer1: Timer1 {
                tccr1b: self.register(names::TCCR1B),
                ocr1a: self.wide(names::OCR1A),
                timsk1: self.register(names::TIMSK1),
            },
            usart0: Usart0 {
                ucsr0a: self.register(names::UCSR0A),
                ucsr0b: self.register(names::UCSR0B),
                ucsr0c: self.register(names::UCSR0C),
                ubrr0: self.wide(names::UBRR0),
                udr0: self.register(names::UDR0),
            },
            spi: Spi {
                spcr: self.register(names::SPCR),
                spsr: self.register(names::SPSR),
                spdr: self.register(names::SPDR),
            },
        }
    }

    /// A single 8-bit register on this bus
    pub fn register<B>(&self, name: &'static str) -> MockRegister<B> {
        MockRegister {
            name,
            bus: self.clone(),
            _bits: PhantomData,
        }
    }

    /// A single 16-bit register on this bus
    pub fn wide(&self, name: &'static str) -> MockWide {
        MockWide {
            name,
            bus: self.clone(),
        }
    }

    /// Preset a register value without logging an access
    pub fn set(&self, name: &'static str, value: u16) {
        self.state.borrow_mut().slots.entry(name).or_default().value = value;
    }

    /// Queue values for the next reads of a register
    ///
    /// Once the script runs dry, reads fall back to the stored value.
    pub fn script(&self, name: &'static str, reads: &[u16]) {
        let mut state = self.state.borrow_mut();
        let slot = state.slots.entry(name).or_default();
        slot.script.extend(reads.iter().copied());
    }

    /// Current stored value of a register
    pub fn value(&self, name: &'static str) -> u16 {
        self.state
            .borrow()
            .slots
            .get(name)
            .map(|slot| slot.value)
            .unwrap_or(0)
    }

    /// Every access so far, in order
    pub fn log(&self) -> Vec<Access> {
        self.state.borrow().log.clone()
    }

    /// Values written to one register, in order
    pub fn writes(&self, name: &'static str) -> Vec<u16> {
        self.state
            .borrow()
            .log
            .iter()
            .filter_map(|access| match *access {
                Access::Write(n, v) if n == name => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of one register
    pub fn reads(&self, name: &'static str) -> usize {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|access| matches!(access, Access::Read(n, _) if *n == name))
            .count()
    }

    /// Forget all logged accesses, keeping register values
    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    fn read(&self, name: &'static str) -> u16 {
        let mut state = self.state.borrow_mut();
        let slot = state.slots.entry(name).or_default();
        let value = slot.script.pop_front().unwrap_or(slot.value);
        state.log.push(Access::Read(name, value));
        value
    }

    fn write(&self, name: &'static str, value: u16) {
        let mut state = self.state.borrow_mut();
        state.slots.entry(name).or_default().value = value;
        state.log.push(Access::Write(name, value));
    }
}

/// 8-bit mock register
pub struct MockRegister<B> {
    name: &'static str,
    bus: MockBus,
    _bits: PhantomData<B>,
}

impl<B: BitPosition> Register<B> for MockRegister<B> {
    fn read(&self) -> u8 {
        self.bus.read(self.name) as u8
    }

    fn write(&mut self, value: u8) {
        self.bus.write(self.name, value as u16);
    }
}

/// 16-bit mock register
pub struct MockWide {
    name: &'static str,
    bus: MockBus,
}

impl WideRegister for MockWide {
    fn read(&self) -> u16 {
        self.bus.read(self.name)
    }

    fn write(&mut self, value: u16) {
        self.bus.write(self.name, value);
    }
}

/// Register family backed by a [`MockBus`]
pub struct MockFamily;

impl RegisterFamily for MockFamily {
    type Reg<B: BitPosition> = MockRegister<B>;
    type Wide = MockWide;
}
