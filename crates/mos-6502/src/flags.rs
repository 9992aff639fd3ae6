//! 6502 processor status flags.
//!
//! The status byte is never stored packed. Each flag lives in its own cell,
//! written with a single store by whichever operation produces it, and the
//! byte is assembled only when something actually reads it.

/// Carry flag (bit 0).
pub const C: u8 = 0x01;
/// Zero flag (bit 1).
pub const Z: u8 = 0x02;
/// Interrupt disable (bit 2).
pub const I: u8 = 0x04;
/// Decimal mode (bit 3).
pub const D: u8 = 0x08;
/// Break (bit 4). Only exists on the stack.
pub const B: u8 = 0x10;
/// Unused (bit 5). Always reads as 1.
pub const U: u8 = 0x20;
/// Overflow (bit 6).
pub const V: u8 = 0x40;
/// Negative (bit 7).
pub const N: u8 = 0x80;

/// Decomposed processor status.
///
/// | Cell                | Encodes                |
/// |---------------------|------------------------|
/// | `negative_result`   | N = bit 7              |
/// | `zero_result`       | Z = cell is zero       |
/// | `carry`             | C = bit 0              |
/// | `overflow`          | V = bit 6              |
/// | `decimal`           | D = bit 3              |
/// | `inverse_interrupt` | I = cell is zero       |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagBank {
    pub negative_result: u8,
    pub zero_result: u8,
    pub carry: u8,
    pub overflow: u8,
    pub decimal: u8,
    pub inverse_interrupt: u8,
}

impl Default for FlagBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagBank {
    /// Power-on flags: only I set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            negative_result: 0,
            zero_result: 1,
            carry: 0,
            overflow: 0,
            decimal: 0,
            inverse_interrupt: 0,
        }
    }

    /// Status byte as a host or PLP-after-PHP would see it: U set, B clear.
    #[must_use]
    pub const fn packed(&self) -> u8 {
        (self.negative_result & N)
            | (self.overflow & V)
            | U
            | (self.decimal & D)
            | if self.inverse_interrupt == 0 { I } else { 0 }
            | if self.zero_result == 0 { Z } else { 0 }
            | (self.carry & C)
    }

    /// Status byte as pushed by PHP and BRK.
    #[must_use]
    pub const fn packed_with_break(&self) -> u8 {
        self.packed() | B
    }

    /// Split a packed status byte back into cells. B and U are ignored.
    pub fn apply(&mut self, p: u8) {
        self.negative_result = p & N;
        self.overflow = p & V;
        self.decimal = p & D;
        self.inverse_interrupt = !p & I;
        self.zero_result = !p & Z;
        self.carry = p & C;
    }

    /// Set N and Z from a result byte. Nearly every instruction ends here.
    #[inline]
    pub fn set_nz(&mut self, value: u8) {
        self.negative_result = value;
        self.zero_result = value;
    }

    #[inline]
    pub fn set_carry(&mut self, set: bool) {
        self.carry = u8::from(set);
    }

    #[inline]
    pub fn set_overflow(&mut self, set: bool) {
        self.overflow = if set { V } else { 0 };
    }

    #[inline]
    pub fn set_decimal(&mut self, set: bool) {
        self.decimal = if set { D } else { 0 };
    }

    #[inline]
    pub fn set_interrupt_disable(&mut self, set: bool) {
        self.inverse_interrupt = if set { 0 } else { I };
    }

    #[must_use]
    pub const fn carry(&self) -> bool {
        self.carry & C != 0
    }

    #[must_use]
    pub const fn zero(&self) -> bool {
        self.zero_result == 0
    }

    #[must_use]
    pub const fn negative(&self) -> bool {
        self.negative_result & N != 0
    }

    #[must_use]
    pub const fn overflow(&self) -> bool {
        self.overflow & V != 0
    }

    #[must_use]
    pub const fn decimal(&self) -> bool {
        self.decimal & D != 0
    }

    #[must_use]
    pub const fn interrupt_disable(&self) -> bool {
        self.inverse_interrupt == 0
    }

    /// Check a single packed flag bit.
    #[must_use]
    pub const fn is_set(&self, flag: u8) -> bool {
        self.packed() & flag != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_reads_as_u_and_i() {
        assert_eq!(FlagBank::new().packed(), U | I);
    }

    #[test]
    fn round_trip_every_byte() {
        let mut flags = FlagBank::new();
        for p in 0..=0xFFu8 {
            flags.apply(p);
            assert_eq!(flags.packed(), (p | U) & !B, "round trip of ${p:02X}");
            assert_eq!(flags.packed_with_break(), p | U | B);
        }
    }

    #[test]
    fn nz_from_result() {
        let mut flags = FlagBank::new();
        flags.set_nz(0x00);
        assert!(flags.zero());
        assert!(!flags.negative());
        flags.set_nz(0x80);
        assert!(!flags.zero());
        assert!(flags.negative());
    }

    #[test]
    fn setters_touch_only_their_bit() {
        let mut flags = FlagBank::new();
        flags.apply(0);
        flags.set_carry(true);
        flags.set_overflow(true);
        flags.set_decimal(true);
        assert_eq!(flags.packed(), U | C | V | D);
        flags.set_interrupt_disable(true);
        assert!(flags.is_set(I));
        flags.set_interrupt_disable(false);
        assert!(!flags.is_set(I));
    }
}
