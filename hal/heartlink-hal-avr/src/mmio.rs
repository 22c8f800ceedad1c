//! Volatile register backend
//!
//! [`MmioFamily`] maps the `heartlink-hal` register traits onto real
//! memory-mapped I/O. Handles only carry an address; all access goes
//! through `read_volatile`/`write_volatile`.

use core::marker::PhantomData;
use core::ptr::{read_volatile, write_volatile};

use heartlink_hal::{BitPosition, Register, RegisterFamily, WideRegister};

/// 8-bit memory-mapped register with bit enum `B`
pub struct Mmio<B> {
    addr: usize,
    _bits: PhantomData<B>,
}

impl<B> Mmio<B> {
    /// Create a handle for the register at `addr`
    ///
    /// # Safety
    ///
    /// `addr` must be the data-space address of an 8-bit register whose
    /// bit layout matches `B`, and no other handle to the same register
    /// may be used concurrently.
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr,
            _bits: PhantomData,
        }
    }

    /// Data-space address of this register
    pub fn addr(&self) -> usize {
        self.addr
    }
}

impl<B: BitPosition> Register<B> for Mmio<B> {
    fn read(&self) -> u8 {
        // SAFETY: address validity is guaranteed by `Mmio::new`
        unsafe { read_volatile(self.addr as *const u8) }
    }

    fn write(&mut self, value: u8) {
        // SAFETY: address validity is guaranteed by `Mmio::new`
        unsafe { write_volatile(self.addr as *mut u8, value) }
    }
}

/// 16-bit memory-mapped register pair
///
/// AVR latches the high byte in a shared TEMP register: it must be written
/// before the low byte and read after it.
pub struct Mmio16 {
    low: usize,
}

impl Mmio16 {
    /// Create a handle for the register pair whose low byte is at `low`
    ///
    /// # Safety
    ///
    /// Same contract as [`Mmio::new`], for both `low` and `low + 1`.
    pub const unsafe fn new(low: usize) -> Self {
        Self { low }
    }
}

impl WideRegister for Mmio16 {
    fn read(&self) -> u16 {
        // SAFETY: address validity is guaranteed by `Mmio16::new`
        unsafe {
            let lo = read_volatile(self.low as *const u8);
            let hi = read_volatile((self.low + 1) as *const u8);
            u16::from_le_bytes([lo, hi])
        }
    }

    fn write(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        // SAFETY: address validity is guaranteed by `Mmio16::new`
        unsafe {
            write_volatile((self.low + 1) as *mut u8, hi);
            write_volatile(self.low as *mut u8, lo);
        }
    }
}

/// Register family backed by real hardware
pub struct MmioFamily;

impl RegisterFamily for MmioFamily {
    type Reg<B: BitPosition> = Mmio<B>;
    type Wide = Mmio16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Spcr;

    // Host memory stands in for the register file.

    #[test]
    fn test_bit_ops_through_memory() {
        let mut cell: u8 = 0;
        let mut reg: Mmio<Spcr> = unsafe { Mmio::new(&mut cell as *mut u8 as usize) };

        reg.set_bit(Spcr::Spe);
        reg.set_bit(Spcr::Mstr);
        assert_eq!(reg.read(), 0x50);

        reg.toggle_bit(Spcr::Spe);
        assert_eq!(reg.read(), 0x10);
        assert_eq!(cell, 0x10);
    }

    #[test]
    fn test_wide_little_endian_layout() {
        let mut pair: [u8; 2] = [0; 2];
        let mut reg = unsafe { Mmio16::new(pair.as_mut_ptr() as usize) };

        reg.write(62_499);
        assert_eq!(pair, [0x23, 0xF4]);
        assert_eq!(reg.read(), 62_499);
    }
}
