//! Blocking byte transfer primitives
//!
//! Every primitive busy-polls a hardware ready flag before touching a data
//! register. The plain forms never give up: a silent peer blocks the caller
//! forever while the heartbeat keeps running. The `*_within` forms take a
//! [`Patience`] and report a [`TransferError`] instead.
//!
//! These are foreground-only. If an interrupt handler ever needs the UART
//! or SPI, foreground accesses must move inside a critical section first.

use core::fmt;

use heartlink_hal::poll::{spin_until, wait_until};
use heartlink_hal::{Patience, Register, RegisterFamily};
use heartlink_hal_avr::bits::{Spsr, Ucsr0a};
use heartlink_hal_avr::peripherals::{Spi as SpiRegs, Usart0};

/// A bounded poll gave up before the hardware became ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// UART transmit register never became empty
    UartTxTimeout,
    /// No UART byte arrived
    UartRxTimeout,
    /// SPI transfer never completed
    SpiTimeout,
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::UartTxTimeout => f.write_str("timed out waiting for UART transmit"),
            TransferError::UartRxTimeout => f.write_str("timed out waiting for UART receive"),
            TransferError::SpiTimeout => f.write_str("timed out waiting for SPI transfer"),
        }
    }
}

impl embedded_io::Error for TransferError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::TimedOut
    }
}

impl embedded_hal::spi::Error for TransferError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

/// USART0 channel (host link)
pub struct Uart<F: RegisterFamily> {
    regs: Usart0<F>,
    patience: Patience,
}

impl<F: RegisterFamily> Uart<F> {
    /// Wrap already-configured USART0 registers
    pub fn new(regs: Usart0<F>, patience: Patience) -> Self {
        Self { regs, patience }
    }

    /// Check if the transmit data register can take a byte
    pub fn is_tx_ready(&self) -> bool {
        self.regs.ucsr0a.is_set(Ucsr0a::Udre0)
    }

    /// Check if a received byte is waiting
    pub fn is_rx_ready(&self) -> bool {
        self.regs.ucsr0a.is_set(Ucsr0a::Rxc0)
    }

    /// Send one byte, waiting as long as it takes for the transmitter
    ///
    /// Returns once the byte is in the transmit register, not once it has
    /// left the wire.
    pub fn send_uart_byte(&mut self, byte: u8) {
        spin_until(|| self.is_tx_ready());
        self.regs.udr0.write(byte);
    }

    /// Send one byte, giving up after `patience`
    pub fn send_uart_byte_within(
        &mut self,
        byte: u8,
        patience: Patience,
    ) -> Result<(), TransferError> {
        wait_until(|| self.is_tx_ready(), patience).map_err(|_| TransferError::UartTxTimeout)?;
        self.regs.udr0.write(byte);
        Ok(())
    }

    /// Receive one byte, waiting as long as it takes for it to arrive
    pub fn receive_uart_byte(&mut self) -> u8 {
        spin_until(|| self.is_rx_ready());
        self.regs.udr0.read()
    }

    /// Receive one byte, giving up after `patience`
    pub fn receive_uart_byte_within(&mut self, patience: Patience) -> Result<u8, TransferError> {
        wait_until(|| self.is_rx_ready(), patience).map_err(|_| TransferError::UartRxTimeout)?;
        Ok(self.regs.udr0.read())
    }

    /// Change the poll limit used by the `embedded-io` implementations
    pub fn set_patience(&mut self, patience: Patience) {
        self.patience = patience;
    }
}

impl<F: RegisterFamily> embedded_io::ErrorType for Uart<F> {
    type Error = TransferError;
}

impl<F: RegisterFamily> embedded_io::Write for Uart<F> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for (written, &byte) in buf.iter().enumerate() {
            if let Err(e) = self.send_uart_byte_within(byte, self.patience) {
                return if written == 0 { Err(e) } else { Ok(written) };
            }
        }
        Ok(buf.len())
    }

    /// Wait until the last byte has been handed to the transmitter
    fn flush(&mut self) -> Result<(), Self::Error> {
        wait_until(|| self.is_tx_ready(), self.patience).map_err(|_| TransferError::UartTxTimeout)
    }
}

impl<F: RegisterFamily> embedded_io::Read for Uart<F> {
    /// Block for the first byte, then take whatever else is already waiting
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.receive_uart_byte_within(self.patience)?;

        let mut count = 1;
        for slot in rest {
            if !self.is_rx_ready() {
                break;
            }
            *slot = self.regs.udr0.read();
            count += 1;
        }
        Ok(count)
    }
}

impl<F: RegisterFamily> embedded_io::ReadReady for Uart<F> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_rx_ready())
    }
}

impl<F: RegisterFamily> embedded_io::WriteReady for Uart<F> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_tx_ready())
    }
}

/// SPI controller channel (co-processor link)
pub struct Spi<F: RegisterFamily> {
    regs: SpiRegs<F>,
    /// A transfer was started and its completion has not been seen
    in_flight: bool,
    patience: Patience,
}

impl<F: RegisterFamily> Spi<F> {
    /// Wrap already-configured SPI registers
    pub fn new(regs: SpiRegs<F>, patience: Patience) -> Self {
        Self {
            regs,
            in_flight: false,
            patience,
        }
    }

    /// Check if the transfer-complete flag is set
    pub fn is_complete(&self) -> bool {
        self.regs.spsr.is_set(Spsr::Spif)
    }

    /// Check if a started transfer has not been seen to complete
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Send one byte, waiting as long as it takes
    ///
    /// Whatever the co-processor clocks back is discarded.
    pub fn send_spi_byte(&mut self, byte: u8) {
        if self.in_flight {
            spin_until(|| self.is_complete());
        }
        self.regs.spdr.write(byte);
        self.in_flight = true;
        spin_until(|| self.is_complete());
        self.in_flight = false;
    }

    /// Send one byte, giving up after `patience` on either wait
    ///
    /// On timeout the transfer stays marked in flight, and the next send
    /// first waits for it to finish.
    pub fn send_spi_byte_within(
        &mut self,
        byte: u8,
        patience: Patience,
    ) -> Result<(), TransferError> {
        self.finish_within(patience)?;
        self.regs.spdr.write(byte);
        self.in_flight = true;
        self.finish_within(patience)
    }

    /// Full-duplex exchange of one byte, returning what was clocked in
    pub fn exchange_within(&mut self, byte: u8, patience: Patience) -> Result<u8, TransferError> {
        self.send_spi_byte_within(byte, patience)?;
        Ok(self.regs.spdr.read())
    }

    fn finish_within(&mut self, patience: Patience) -> Result<(), TransferError> {
        if self.in_flight {
            wait_until(|| self.is_complete(), patience).map_err(|_| TransferError::SpiTimeout)?;
            self.in_flight = false;
        }
        Ok(())
    }

    /// Change the poll limit used by the `embedded-hal` implementation
    pub fn set_patience(&mut self, patience: Patience) {
        self.patience = patience;
    }
}

impl<F: RegisterFamily> embedded_hal::spi::ErrorType for Spi<F> {
    type Error = TransferError;
}

impl<F: RegisterFamily> embedded_hal::spi::SpiBus<u8> for Spi<F> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange_within(0x00, self.patience)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.send_spi_byte_within(word, self.patience)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let out = write.get(i).copied().unwrap_or(0x00);
            let received = self.exchange_within(out, self.patience)?;
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange_within(*word, self.patience)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.finish_within(self.patience)
    }
}
