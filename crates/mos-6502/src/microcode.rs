//! Micro-operations: the atomic steps instruction programs are made of.
//!
//! A step either touches the bus (schedules exactly one transaction) or is
//! pure (register arithmetic, address computation, splicing). Pure steps
//! cost nothing; the scheduler runs them back to back until the next bus
//! step. Every instruction is a short list of these, and its documented
//! cycle count is the opcode fetch plus the bus steps it runs.

/// Where a value read from the bus lands once the transaction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    Discard,
    Opcode,
    Operand,
    /// Effective address, zero-extended (zero page or low byte).
    Address,
    AddressHigh,
    /// Indirection pointer, zero-extended.
    Pointer,
    PointerHigh,
    PcLow,
    PcHigh,
    /// Packed status byte, split straight into the flag cells.
    Flags,
    /// Zero-page byte examined by BBR/BBS.
    BitTest,
}

/// Value written by a stack push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Source {
    A,
    X,
    Y,
    PcHigh,
    PcLow,
    /// Status with B set (PHP, BRK).
    StatusWithBreak,
    /// Status with B clear (IRQ, NMI).
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Index {
    X,
    Y,
}

/// How a pointer is advanced to its second byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Wrap {
    /// Low byte wraps without touching the high byte. Zero-page pointers
    /// and the NMOS `JMP ($xxFF)` bug.
    Page,
    /// Full 16-bit increment.
    Carry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    Plus,
    Minus,
    OverflowClear,
    OverflowSet,
    CarryClear,
    CarrySet,
    NotEqual,
    Equal,
    Always,
    /// BBRn: taken when bit n of the tested byte is clear.
    BitClear(u8),
    /// BBSn: taken when bit n of the tested byte is set.
    BitSet(u8),
}

/// Interrupt vector kinds as seen by the vector programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vector {
    Nmi,
    Reset,
    /// IRQ and BRK. A pending NMI hijacks it.
    Irq,
}

impl Vector {
    #[must_use]
    pub const fn address(self) -> u16 {
        match self {
            Self::Nmi => 0xFFFA,
            Self::Reset => 0xFFFC,
            Self::Irq => 0xFFFE,
        }
    }
}

/// Instruction semantics, independent of addressing.
///
/// Read-class operations consume the operand latch; write-class ones fill
/// it; read-modify-write ones transform it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    // Loads and stores
    Lda,
    Ldx,
    Ldy,
    Sta,
    Stx,
    Sty,
    Stz,

    // ALU
    Ora,
    And,
    Eor,
    Adc,
    Sbc,
    Cmp,
    Cpx,
    Cpy,
    Bit,
    BitImmediate,

    // Read-modify-write
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
    Tsb,
    Trb,
    Rmb(u8),
    Smb(u8),

    // Register transfers and flag operations
    Tax,
    Tay,
    Txa,
    Tya,
    Tsx,
    Txs,
    Inx,
    Iny,
    Dex,
    Dey,
    Clc,
    Sec,
    Cli,
    Sei,
    Cld,
    Sed,
    Clv,
    Nop,

    // Control
    Jmp,
    Wai,
    Stp,
    Jam,

    // NMOS undocumented
    Slo,
    Rla,
    Sre,
    Rra,
    Sax,
    Lax,
    Dcp,
    Isc,
    Anc,
    Alr,
    Arr,
    Ane,
    Lxa,
    Sbx,
    Las,
    Sha,
    Shx,
    Shy,
    Shs,
}

/// How an operation uses its effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Modify,
    /// SHA/SHX/SHY/SHS: a write whose address and value both depend on
    /// the unfixed high byte.
    UnstableStore,
}

impl Operation {
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Sta | Self::Stx | Self::Sty | Self::Stz | Self::Sax => Access::Write,
            Self::Asl
            | Self::Lsr
            | Self::Rol
            | Self::Ror
            | Self::Inc
            | Self::Dec
            | Self::Tsb
            | Self::Trb
            | Self::Rmb(_)
            | Self::Smb(_)
            | Self::Slo
            | Self::Rla
            | Self::Sre
            | Self::Rra
            | Self::Dcp
            | Self::Isc => Access::Modify,
            Self::Sha | Self::Shx | Self::Shy | Self::Shs => Access::UnstableStore,
            _ => Access::Read,
        }
    }

    /// Shifts and rotates. The 65C02 skips their abs,X fix-up cycle when
    /// no page is crossed.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Asl | Self::Lsr | Self::Rol | Self::Ror)
    }
}

/// One scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MicroOp {
    // ---- bus steps ----
    /// Opcode read at PC (SYNC cycle).
    FetchOpcode,
    /// Read at PC, then increment PC.
    FetchPc(Target),
    /// Throwaway read at PC.
    ReadPc,
    /// Throwaway read at PC that does not sample the interrupt lines.
    ReadPcHolding,
    ReadAddress(Target),
    /// Write the operand latch to the effective address.
    WriteAddress,
    /// Throwaway re-read of the previous bus address (65C02 dummy cycles).
    ReadPrevious,
    ReadPointer(Target),
    /// Throwaway read at the stack pointer.
    ReadStack,
    Push(Source),
    /// Stack read with S decrement; reset's suppressed pushes.
    PushDiscard,
    /// Increment S, then read the stack.
    Pull(Target),
    ReadVectorLow,
    ReadVectorHigh,
    /// Idle cycle with nothing on the bus.
    Idle,

    // ---- pure steps ----
    Decode,
    Execute(Operation),
    /// Run a read-modify-write operation on A.
    Accumulator(Operation),
    /// Add an index to the address low byte, leaving the high byte unfixed.
    IndexLow(Index),
    /// Add an index within page zero.
    ZeroPageIndex(Index),
    /// Add X to the pointer.
    IndexPointer(Wrap),
    IncrementPointer(Wrap),
    /// Splice in the page fix-up only if the index carried.
    FixIfCrossed,
    /// Always splice in the page fix-up.
    PageFix,
    /// Apply the carry from `IndexLow`.
    FixHigh,
    Branch(Condition),
    /// Move PC's low byte to the branch target, keeping the old page.
    BranchLow,
    BranchJump,
    PickVector(Vector),
    /// Set I (and on CMOS, clear D) on entry to a vector.
    EnterInterrupt,
}

impl MicroOp {
    /// True for steps that schedule a bus transaction.
    #[must_use]
    pub const fn touches_bus(self) -> bool {
        matches!(
            self,
            Self::FetchOpcode
                | Self::FetchPc(_)
                | Self::ReadPc
                | Self::ReadPcHolding
                | Self::ReadAddress(_)
                | Self::WriteAddress
                | Self::ReadPrevious
                | Self::ReadPointer(_)
                | Self::ReadStack
                | Self::Push(_)
                | Self::PushDiscard
                | Self::Pull(_)
                | Self::ReadVectorLow
                | Self::ReadVectorHigh
                | Self::Idle
        )
    }
}
