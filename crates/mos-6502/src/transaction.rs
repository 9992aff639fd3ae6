//! The single in-flight bus request.

use emu_core::BusOperation;

use crate::microcode::Target;

/// A bus transaction scheduled by a micro-op and not yet performed.
///
/// At most one exists at a time. When a cycle budget runs out the core
/// stops with this pending, so a host can see exactly what the next cycle
/// will do before it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    pub operation: BusOperation,
    pub address: u16,
    /// Byte to write, or the byte read once performed.
    pub value: u8,
    /// Where a read value lands.
    pub target: Target,
    /// False for the one cycle of a taken branch that doesn't update the
    /// interrupt sample.
    pub samples_interrupts: bool,
}

impl Transaction {
    #[must_use]
    pub const fn read(address: u16, target: Target) -> Self {
        Self {
            operation: BusOperation::Read,
            address,
            value: 0,
            target,
            samples_interrupts: true,
        }
    }

    #[must_use]
    pub const fn write(address: u16, value: u8) -> Self {
        Self {
            operation: BusOperation::Write,
            address,
            value,
            target: Target::Discard,
            samples_interrupts: true,
        }
    }

    /// True for the opcode fetch that starts every instruction.
    #[must_use]
    pub fn is_opcode_fetch(&self) -> bool {
        self.operation == BusOperation::ReadOpcode
    }
}
