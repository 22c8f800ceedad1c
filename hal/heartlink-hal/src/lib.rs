//! Heartlink Hardware Abstraction Layer
//!
//! This crate defines the register-level traits and peripheral configuration
//! types shared by the chip backend and the board-agnostic bridge logic.
//! Nothing in here touches memory directly; chip crates provide the
//! volatile backend and host tests provide a recording mock.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  heartlink-firmware (entry, ISR, loop)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  heartlink-core (init, heartbeat, I/O)  │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ heartlink-hal │       │ heartlink-hal-│
//! │   (traits)    │◄──────│      avr      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`register`] - Typed 8-bit and 16-bit register access
//! - [`gpio`] - Pin levels
//! - [`uart`] - UART frame configuration
//! - [`spi`] - SPI controller configuration
//! - [`poll`] - Busy-poll helpers with optional give-up

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod poll;
pub mod register;
pub mod spi;
pub mod uart;

// Re-export key items at crate root for convenience
pub use gpio::Level;
pub use poll::{spin_until, wait_until, Patience, TimedOut};
pub use register::{BitPosition, Register, RegisterFamily, WideRegister};
