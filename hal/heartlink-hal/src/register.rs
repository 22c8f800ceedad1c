//! Memory-mapped register abstractions
//!
//! Every configuration and status word is reached through [`Register`],
//! parameterized by an enum of the bit positions that are valid for that
//! particular register. A bit from one register cannot be applied to
//! another, and an out-of-range index cannot be written at all.

/// A named bit position inside an 8-bit register
///
/// Implemented by per-register enums such as `Ucsr0a::Udre0`.
pub trait BitPosition: Copy {
    /// Bit index, 0..=7
    fn index(self) -> u8;

    /// Single-bit mask for this position
    fn mask(self) -> u8 {
        1 << self.index()
    }
}

/// Combine several bit positions into one mask
pub fn mask_of<B: BitPosition>(bits: &[B]) -> u8 {
    bits.iter().fold(0, |acc, bit| acc | bit.mask())
}

/// Readable and writable 8-bit register
///
/// Only [`read`](Register::read) and [`write`](Register::write) touch the
/// backing storage; the bit helpers are a single read-modify-write each.
pub trait Register<B: BitPosition> {
    /// Read the current register value
    fn read(&self) -> u8;

    /// Overwrite the register value
    fn write(&mut self, value: u8);

    /// Apply `f` to the current value and write the result back
    fn modify<F: FnOnce(u8) -> u8>(&mut self, f: F) {
        let value = self.read();
        self.write(f(value));
    }

    /// Set a bit (OR with mask)
    fn set_bit(&mut self, bit: B) {
        self.modify(|v| v | bit.mask());
    }

    /// Clear a bit (AND with inverted mask)
    fn clear_bit(&mut self, bit: B) {
        self.modify(|v| v & !bit.mask());
    }

    /// Toggle a bit (XOR with mask)
    fn toggle_bit(&mut self, bit: B) {
        self.modify(|v| v ^ bit.mask());
    }

    /// Check whether a bit currently reads as 1
    fn is_set(&self, bit: B) -> bool {
        self.read() & bit.mask() != 0
    }

    /// Overwrite the register so exactly `bits` are set
    fn write_bits(&mut self, bits: &[B]) {
        self.write(mask_of(bits));
    }

    /// Set every bit in `bits`, leaving the others untouched
    fn set_bits(&mut self, bits: &[B]) {
        let mask = mask_of(bits);
        self.modify(|v| v | mask);
    }
}

/// 16-bit register accessed as a whole (compare values, baud divisors)
pub trait WideRegister {
    /// Read the full 16-bit value
    fn read(&self) -> u16;

    /// Write the full 16-bit value
    fn write(&mut self, value: u16);
}

/// Family of register implementations
///
/// Lets the same peripheral code run against real memory-mapped hardware
/// or a host-side mock by picking a different family.
pub trait RegisterFamily {
    /// 8-bit register type for the bit enum `B`
    type Reg<B: BitPosition>: Register<B>;

    /// 16-bit register type
    type Wide: WideRegister;
}
