//! Register addresses
//!
//! Data-space addresses (I/O address + 0x20 for the low I/O range), as
//! used with `LD`/`ST`. 16-bit registers are given by their low byte.

// Port B
pub const DDRB: usize = 0x24;
pub const PORTB: usize = 0x25;

// SPI
pub const SPCR: usize = 0x4C;
pub const SPSR: usize = 0x4D;
pub const SPDR: usize = 0x4E;

// Timer/Counter1
pub const TIMSK1: usize = 0x6F;
pub const TCCR1B: usize = 0x81;
pub const OCR1AL: usize = 0x88;

// USART0
pub const UCSR0A: usize = 0xC0;
pub const UCSR0B: usize = 0xC1;
pub const UCSR0C: usize = 0xC2;
pub const UBRR0L: usize = 0xC4;
pub const UDR0: usize = 0xC6;

/// Largest value UBRR0 can hold (12 bits)
pub const UBRR0_MAX: u16 = 0x0FFF;
