//! Micro-op program tables.
//!
//! One table per personality: 256 opcode programs plus the vector programs
//! and the short continuations that get spliced into a running program.
//! Tables are built on first use and shared by every core of that
//! personality.

use std::sync::OnceLock;

use crate::addressing;
use crate::microcode::{Condition, MicroOp, Operation, Source, Target, Vector, Wrap};
use crate::opcodes::{self, Instruction};
use crate::Personality;

use MicroOp::{
    Execute, FetchPc, Pull, Push, PushDiscard, ReadPc, ReadPointer, ReadStack, ReadVectorHigh,
    ReadVectorLow,
};

/// Identifies one program in a [`ProgramTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgramId {
    FetchDecode,
    Opcode(u8),
    Reset,
    Irq,
    Nmi,
    Jam,
    Wait,
    Stop,
    PageFix,
    BranchTaken,
    BranchCrossed,
    DecimalFixup,
    ForcedReturn,
}

/// A position in a program: the next step to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cursor {
    pub program: ProgramId,
    pub step: usize,
}

impl Cursor {
    #[must_use]
    pub const fn start(program: ProgramId) -> Self {
        Self { program, step: 0 }
    }
}

#[derive(Debug)]
pub struct ProgramTable {
    personality: Personality,
    opcodes: Vec<Vec<MicroOp>>,
    fetch_decode: Vec<MicroOp>,
    reset: Vec<MicroOp>,
    irq: Vec<MicroOp>,
    nmi: Vec<MicroOp>,
    jam: Vec<MicroOp>,
    idle: Vec<MicroOp>,
    page_fix: Vec<MicroOp>,
    branch_taken: Vec<MicroOp>,
    branch_crossed: Vec<MicroOp>,
    decimal_fixup: Vec<MicroOp>,
    forced_return: Vec<MicroOp>,
}

static TABLES: [OnceLock<ProgramTable>; 5] = [
    OnceLock::new(),
    OnceLock::new(),
    OnceLock::new(),
    OnceLock::new(),
    OnceLock::new(),
];

impl ProgramTable {
    /// The shared table for `personality`, built on first use.
    #[must_use]
    pub fn for_personality(personality: Personality) -> &'static Self {
        let slot = match personality {
            Personality::Nmos6502 => 0,
            Personality::Ricoh2A03 => 1,
            Personality::Synertek65C02 => 2,
            Personality::Rockwell65C02 => 3,
            Personality::Wdc65C02 => 4,
        };
        TABLES[slot].get_or_init(|| Self::build(personality))
    }

    fn build(personality: Personality) -> Self {
        log::debug!("building {} micro-op tables", personality.name());
        Self {
            personality,
            opcodes: (0..=0xFFu8)
                .map(|opcode| opcode_program(personality, opcode))
                .collect(),
            fetch_decode: vec![MicroOp::FetchOpcode, MicroOp::Decode],
            reset: vec![
                ReadPc,
                ReadPc,
                PushDiscard,
                PushDiscard,
                PushDiscard,
                MicroOp::PickVector(Vector::Reset),
                MicroOp::EnterInterrupt,
                ReadVectorLow,
                ReadVectorHigh,
            ],
            irq: interrupt_program(Vector::Irq),
            nmi: interrupt_program(Vector::Nmi),
            jam: vec![ReadPc],
            idle: vec![MicroOp::Idle],
            page_fix: addressing::page_fix(personality),
            branch_taken: vec![MicroOp::ReadPcHolding, MicroOp::BranchJump],
            branch_crossed: vec![ReadPc, MicroOp::BranchLow, ReadPc, MicroOp::BranchJump],
            decimal_fixup: vec![MicroOp::ReadPrevious],
            forced_return: vec![Pull(Target::PcLow), Pull(Target::PcHigh), FetchPc(Target::Discard)],
        }
    }

    #[must_use]
    pub const fn personality(&self) -> Personality {
        self.personality
    }

    #[must_use]
    pub fn get(&self, program: ProgramId) -> &[MicroOp] {
        match program {
            ProgramId::FetchDecode => &self.fetch_decode,
            ProgramId::Opcode(opcode) => &self.opcodes[opcode as usize],
            ProgramId::Reset => &self.reset,
            ProgramId::Irq => &self.irq,
            ProgramId::Nmi => &self.nmi,
            ProgramId::Jam => &self.jam,
            ProgramId::Wait | ProgramId::Stop => &self.idle,
            ProgramId::PageFix => &self.page_fix,
            ProgramId::BranchTaken => &self.branch_taken,
            ProgramId::BranchCrossed => &self.branch_crossed,
            ProgramId::DecimalFixup => &self.decimal_fixup,
            ProgramId::ForcedReturn => &self.forced_return,
        }
    }

    /// True if `cursor` points at a step of a program, or just past its end.
    #[must_use]
    pub fn contains(&self, cursor: Cursor) -> bool {
        cursor.step <= self.get(cursor.program).len()
    }

    /// Documented cycle count of an opcode when no page is crossed, no
    /// branch is taken and D is clear.
    #[must_use]
    pub fn base_cycles(&self, opcode: u8) -> usize {
        let fix = bus_steps(&self.page_fix);
        1 + self.opcodes[opcode as usize]
            .iter()
            .map(|&step| match step {
                MicroOp::PageFix => fix,
                step => usize::from(step.touches_bus()),
            })
            .sum::<usize>()
    }
}

fn bus_steps(steps: &[MicroOp]) -> usize {
    steps.iter().filter(|step| step.touches_bus()).count()
}

/// IRQ and NMI: BRK's sequence with two throwaway reads in place of the
/// opcode fetch and signature byte, and B clear in the pushed status.
fn interrupt_program(vector: Vector) -> Vec<MicroOp> {
    vec![
        ReadPc,
        ReadPc,
        Push(Source::PcHigh),
        Push(Source::PcLow),
        MicroOp::PickVector(vector),
        Push(Source::Status),
        MicroOp::EnterInterrupt,
        ReadVectorLow,
        ReadVectorHigh,
    ]
}

fn opcode_program(personality: Personality, opcode: u8) -> Vec<MicroOp> {
    let cmos = personality.is_cmos();
    match opcodes::decode(personality, opcode) {
        Instruction::Access(operation, mode) => addressing::program(personality, operation, mode),
        Instruction::Implied(operation) => vec![ReadPc, Execute(operation)],
        Instruction::Accumulator(operation) => vec![ReadPc, MicroOp::Accumulator(operation)],
        Instruction::Branch(condition) => {
            vec![FetchPc(Target::Operand), MicroOp::Branch(condition)]
        }
        Instruction::BitBranch(condition) => vec![
            FetchPc(Target::Address),
            MicroOp::ReadAddress(Target::BitTest),
            MicroOp::ReadAddress(Target::Discard),
            FetchPc(Target::Operand),
            MicroOp::Branch(condition),
        ],
        Instruction::Push(source) => vec![ReadPc, Push(source)],
        Instruction::Pull(operation) => {
            vec![ReadPc, ReadStack, Pull(Target::Operand), Execute(operation)]
        }
        Instruction::PullStatus => vec![ReadPc, ReadStack, Pull(Target::Flags)],
        Instruction::Jsr => vec![
            FetchPc(Target::Address),
            ReadStack,
            Push(Source::PcHigh),
            Push(Source::PcLow),
            FetchPc(Target::AddressHigh),
            Execute(Operation::Jmp),
        ],
        Instruction::Rts => vec![
            ReadPc,
            ReadStack,
            Pull(Target::PcLow),
            Pull(Target::PcHigh),
            FetchPc(Target::Discard),
        ],
        Instruction::Rti => vec![
            ReadPc,
            ReadStack,
            Pull(Target::Flags),
            Pull(Target::PcLow),
            Pull(Target::PcHigh),
        ],
        Instruction::Brk => vec![
            FetchPc(Target::Discard),
            Push(Source::PcHigh),
            Push(Source::PcLow),
            MicroOp::PickVector(Vector::Irq),
            Push(Source::StatusWithBreak),
            MicroOp::EnterInterrupt,
            ReadVectorLow,
            ReadVectorHigh,
        ],
        Instruction::Jump => vec![
            FetchPc(Target::Address),
            FetchPc(Target::AddressHigh),
            Execute(Operation::Jmp),
        ],
        // NMOS keeps the pointer in its page; the 65C02 carries and pays
        // a cycle for it.
        Instruction::JumpIndirect if cmos => vec![
            FetchPc(Target::Pointer),
            FetchPc(Target::PointerHigh),
            MicroOp::ReadPrevious,
            ReadPointer(Target::Address),
            MicroOp::IncrementPointer(Wrap::Carry),
            ReadPointer(Target::AddressHigh),
            Execute(Operation::Jmp),
        ],
        Instruction::JumpIndirect => vec![
            FetchPc(Target::Pointer),
            FetchPc(Target::PointerHigh),
            ReadPointer(Target::Address),
            MicroOp::IncrementPointer(Wrap::Page),
            ReadPointer(Target::AddressHigh),
            Execute(Operation::Jmp),
        ],
        Instruction::JumpIndexedIndirect => vec![
            FetchPc(Target::Pointer),
            FetchPc(Target::PointerHigh),
            MicroOp::ReadPrevious,
            MicroOp::IndexPointer(Wrap::Carry),
            ReadPointer(Target::Address),
            MicroOp::IncrementPointer(Wrap::Carry),
            ReadPointer(Target::AddressHigh),
            Execute(Operation::Jmp),
        ],
        Instruction::Halt(operation) => vec![ReadPc, ReadPc, Execute(operation)],
        Instruction::QuickNop => Vec::new(),
        Instruction::LongNop => {
            let mut steps = vec![FetchPc(Target::Address), FetchPc(Target::AddressHigh)];
            steps.extend([MicroOp::ReadAddress(Target::Discard); 5]);
            steps
        }
        Instruction::Jam => vec![Execute(Operation::Jam)],
    }
}

/// Whether a branch condition holds. BBR/BBS test `bit_test`.
#[must_use]
pub fn condition_holds(
    condition: Condition,
    flags: &crate::FlagBank,
    bit_test: u8,
) -> bool {
    match condition {
        Condition::Plus => !flags.negative(),
        Condition::Minus => flags.negative(),
        Condition::OverflowClear => !flags.overflow(),
        Condition::OverflowSet => flags.overflow(),
        Condition::CarryClear => !flags.carry(),
        Condition::CarrySet => flags.carry(),
        Condition::NotEqual => !flags.zero(),
        Condition::Equal => flags.zero(),
        Condition::Always => true,
        Condition::BitClear(bit) => bit_test & (1 << bit) == 0,
        Condition::BitSet(bit) => bit_test & (1 << bit) != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_shared() {
        let a = ProgramTable::for_personality(Personality::Wdc65C02);
        let b = ProgramTable::for_personality(Personality::Wdc65C02);
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.personality(), Personality::Wdc65C02);
        assert!(!std::ptr::eq(
            a,
            ProgramTable::for_personality(Personality::Nmos6502)
        ));
    }

    #[test]
    fn vector_programs_take_seven_cycles() {
        let table = ProgramTable::for_personality(Personality::Nmos6502);
        for program in [ProgramId::Reset, ProgramId::Irq, ProgramId::Nmi] {
            assert_eq!(bus_steps(table.get(program)), 7, "{program:?}");
        }
        assert_eq!(table.base_cycles(0x00), 7);
    }

    #[test]
    fn jump_indirect_timing_differs_by_family() {
        assert_eq!(
            ProgramTable::for_personality(Personality::Nmos6502).base_cycles(0x6C),
            5
        );
        assert_eq!(
            ProgramTable::for_personality(Personality::Synertek65C02).base_cycles(0x6C),
            6
        );
        assert_eq!(
            ProgramTable::for_personality(Personality::Synertek65C02).base_cycles(0x7C),
            6
        );
    }

    #[test]
    fn cursor_bounds() {
        let table = ProgramTable::for_personality(Personality::Nmos6502);
        assert!(table.contains(Cursor { program: ProgramId::FetchDecode, step: 2 }));
        assert!(!table.contains(Cursor { program: ProgramId::FetchDecode, step: 3 }));
    }

    #[test]
    fn branch_conditions() {
        let mut flags = crate::FlagBank::new();
        flags.set_nz(0x80);
        assert!(condition_holds(Condition::Minus, &flags, 0));
        assert!(condition_holds(Condition::NotEqual, &flags, 0));
        assert!(condition_holds(Condition::BitSet(2), &flags, 0x04));
        assert!(condition_holds(Condition::BitClear(3), &flags, 0x04));
    }
}
