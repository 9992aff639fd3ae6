//! Addressing-mode resolution.
//!
//! Builds the micro-op sequence that fetches operand bytes, computes the
//! effective address and performs the access for one `(operation, mode)`
//! pair. The page-crossing and dummy-cycle rules of the two families live
//! here.

use crate::microcode::{Access, Index, MicroOp, Operation, Target, Wrap};
use crate::opcodes::Mode;
use crate::Personality;

use MicroOp::{
    Execute, FetchPc, FixIfCrossed, IncrementPointer, IndexLow, IndexPointer, PageFix,
    ReadAddress, ReadPointer, WriteAddress, ZeroPageIndex,
};

/// Program for an operation applied through a data addressing mode.
#[must_use]
pub fn program(personality: Personality, operation: Operation, mode: Mode) -> Vec<MicroOp> {
    let access = operation.access();
    let mut steps = Vec::with_capacity(8);

    // Page-crossing policy for the indexed modes. Reads only pay when the
    // index carries; writes and NMOS read-modify-writes always pay. The
    // 65C02 lets shifts off the hook too, but not INC/DEC.
    let fix = match access {
        Access::Read => FixIfCrossed,
        Access::Modify if personality.is_cmos() && operation.is_shift() => FixIfCrossed,
        _ => PageFix,
    };

    match mode {
        Mode::Immediate => {
            steps.extend([FetchPc(Target::Operand), Execute(operation)]);
            return steps;
        }
        Mode::ZeroPage => steps.push(FetchPc(Target::Address)),
        Mode::ZeroPageX | Mode::ZeroPageY => steps.extend([
            FetchPc(Target::Address),
            ReadAddress(Target::Discard),
            ZeroPageIndex(index_of(mode)),
        ]),
        Mode::Absolute => steps.extend([FetchPc(Target::Address), FetchPc(Target::AddressHigh)]),
        Mode::AbsoluteX | Mode::AbsoluteY => steps.extend([
            FetchPc(Target::Address),
            FetchPc(Target::AddressHigh),
            IndexLow(index_of(mode)),
        ]),
        Mode::IndexedIndirect => steps.extend([
            FetchPc(Target::Pointer),
            ReadPointer(Target::Discard),
            IndexPointer(Wrap::Page),
            ReadPointer(Target::Address),
            IncrementPointer(Wrap::Page),
            ReadPointer(Target::AddressHigh),
        ]),
        Mode::IndirectIndexed => steps.extend([
            FetchPc(Target::Pointer),
            ReadPointer(Target::Address),
            IncrementPointer(Wrap::Page),
            ReadPointer(Target::AddressHigh),
            IndexLow(Index::Y),
        ]),
        Mode::ZeroPageIndirect => steps.extend([
            FetchPc(Target::Pointer),
            ReadPointer(Target::Address),
            IncrementPointer(Wrap::Page),
            ReadPointer(Target::AddressHigh),
        ]),
    }

    let indexed = matches!(
        mode,
        Mode::AbsoluteX | Mode::AbsoluteY | Mode::IndirectIndexed
    );
    match access {
        Access::UnstableStore => {
            // The fix-up read happens at the unfixed address and the high
            // byte is never corrected; Execute decides what gets written
            // and where.
            steps.extend([ReadAddress(Target::Discard), Execute(operation), WriteAddress]);
            return steps;
        }
        _ if indexed => steps.push(fix),
        _ => {}
    }

    match access {
        Access::Read => steps.extend([ReadAddress(Target::Operand), Execute(operation)]),
        Access::Write => steps.extend([Execute(operation), WriteAddress]),
        Access::Modify if personality.is_cmos() => steps.extend([
            ReadAddress(Target::Operand),
            ReadAddress(Target::Discard),
            Execute(operation),
            WriteAddress,
        ]),
        Access::Modify => steps.extend([
            ReadAddress(Target::Operand),
            WriteAddress,
            Execute(operation),
            WriteAddress,
        ]),
        Access::UnstableStore => {}
    }
    steps
}

/// Continuation spliced in to fix the high byte after an index carry.
#[must_use]
pub fn page_fix(personality: Personality) -> Vec<MicroOp> {
    if personality.is_cmos() {
        vec![MicroOp::ReadPrevious, MicroOp::FixHigh]
    } else {
        vec![ReadAddress(Target::Discard), MicroOp::FixHigh]
    }
}

fn index_of(mode: Mode) -> Index {
    match mode {
        Mode::ZeroPageY | Mode::AbsoluteY => Index::Y,
        _ => Index::X,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_cycles(steps: &[MicroOp]) -> usize {
        steps.iter().filter(|step| step.touches_bus()).count()
    }

    #[test]
    fn base_cycle_counts_exclude_the_fix_up() {
        let nmos = Personality::Nmos6502;
        // Opcode fetch is not part of these programs.
        assert_eq!(bus_cycles(&program(nmos, Operation::Lda, Mode::Immediate)), 1);
        assert_eq!(bus_cycles(&program(nmos, Operation::Lda, Mode::ZeroPageX)), 3);
        assert_eq!(bus_cycles(&program(nmos, Operation::Lda, Mode::AbsoluteX)), 3);
        assert_eq!(bus_cycles(&program(nmos, Operation::Sta, Mode::IndexedIndirect)), 5);
        assert_eq!(bus_cycles(&program(nmos, Operation::Inc, Mode::Absolute)), 5);
        assert_eq!(bus_cycles(&program(nmos, Operation::Sha, Mode::AbsoluteY)), 4);
    }

    #[test]
    fn nmos_modify_writes_twice() {
        let steps = program(Personality::Nmos6502, Operation::Asl, Mode::ZeroPage);
        let writes = steps.iter().filter(|&&s| s == WriteAddress).count();
        assert_eq!(writes, 2);
    }

    #[test]
    fn cmos_modify_reads_twice() {
        let steps = program(Personality::Wdc65C02, Operation::Asl, Mode::ZeroPage);
        let writes = steps.iter().filter(|&&s| s == WriteAddress).count();
        assert_eq!(writes, 1);
        assert!(steps.contains(&ReadAddress(Target::Discard)));
    }

    #[test]
    fn fix_policy() {
        let cmos = Personality::Wdc65C02;
        let nmos = Personality::Nmos6502;
        assert!(program(nmos, Operation::Lda, Mode::AbsoluteX).contains(&FixIfCrossed));
        assert!(program(nmos, Operation::Sta, Mode::AbsoluteX).contains(&PageFix));
        assert!(program(nmos, Operation::Asl, Mode::AbsoluteX).contains(&PageFix));
        assert!(program(cmos, Operation::Asl, Mode::AbsoluteX).contains(&FixIfCrossed));
        assert!(program(cmos, Operation::Inc, Mode::AbsoluteX).contains(&PageFix));
    }
}
