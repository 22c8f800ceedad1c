//! Board-agnostic logic for the heartlink UART/SPI bridge
//!
//! This crate contains everything that does not depend on how registers
//! are physically reached:
//!
//! - Compile-time configuration and timing arithmetic
//! - One-shot peripheral initialization
//! - The heartbeat compare-match handler
//! - Blocking UART and SPI byte primitives
//! - The idle loop and its application hook
//!
//! All of it is generic over a [`heartlink_hal::RegisterFamily`], so the
//! firmware runs it on volatile MMIO while tests run it on [`mock`].

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "mock"))]
extern crate std;

pub mod config;
pub mod heartbeat;
pub mod init;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod run;
#[cfg(test)]
mod scenarios;
pub mod transfer;

pub use config::{BridgeConfig, ConfigError, Prescaler, ToggleConvention, ValidatedConfig};
pub use heartbeat::Heartbeat;
pub use init::{initialize, Bridge};
pub use run::{run, Application, Idle};
pub use transfer::{Spi, TransferError, Uart};
