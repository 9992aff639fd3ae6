//! 6502 CPU registers.

use crate::FlagBank;

/// Names accepted by the debug register interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    ProgramCounter,
    /// Address of the most recent opcode fetch. Read-only.
    LastOperationAddress,
    StackPointer,
    /// Packed status byte, as PHP would see it without B.
    Flags,
    A,
    X,
    Y,
}

/// 6502 CPU register set.
///
/// The 6502 has minimal registers:
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - S: 8-bit stack pointer (stack is at $0100-$01FF)
/// - PC: 16-bit program counter
/// - flags: processor status, kept decomposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (points to next free location, stack at $0100-$01FF).
    pub s: u8,
    /// Program counter.
    pub pc: u16,
    pub flags: FlagBank,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Create registers in power-on state.
    ///
    /// Everything is zero apart from I. The reset sequence that always
    /// follows power-on walks S down by three, to $FD, and loads PC from
    /// the reset vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0,
            pc: 0,
            flags: FlagBank::new(),
        }
    }

    /// Post-decrement push: returns the address to write.
    pub fn push(&mut self) -> u16 {
        let addr = self.stack_addr();
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Pre-increment pop: returns the address to read.
    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        self.stack_addr()
    }

    /// Get the current stack address without modifying S.
    #[must_use]
    pub const fn stack_addr(&self) -> u16 {
        0x0100 | (self.s as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::Registers;

    #[test]
    fn stack_wraps_within_page_one() {
        let mut regs = Registers::new();
        assert_eq!(regs.push(), 0x0100);
        assert_eq!(regs.s, 0xFF);
        assert_eq!(regs.pop(), 0x0100);
        assert_eq!(regs.s, 0x00);
        assert_eq!(regs.pop(), 0x0101);
    }
}
