//! ATmega2560-specific HAL for the heartlink bridge
//!
//! This crate provides the chip side of the `heartlink-hal` traits:
//!
//! - Typed bit positions for every register the bridge touches
//! - Data-space addresses of those registers
//! - A volatile [`mmio::MmioFamily`] register backend
//! - The [`Peripherals`] handle grouping registers per peripheral
//! - Port B pin assignments for the heartbeat LED and SPI lines
//!
//! Register layouts follow the ATmega640/1280/1281/2560/2561 datasheet.

#![no_std]

pub mod bits;
pub mod mmio;
pub mod peripherals;
pub mod pins;
pub mod regs;

pub use mmio::{Mmio, Mmio16, MmioFamily};
pub use peripherals::{Peripherals, PortB, Spi, Timer1, Usart0};
pub use pins::PortPin;
