//! Opcode decoding.
//!
//! Most of the 6502 opcode map decodes as `aaabbbcc`: `cc` picks an
//! instruction group, `aaa` the operation and `bbb` the addressing mode.
//! The exceptions (stack, control flow, the 65C02 additions) are matched
//! explicitly.

use crate::Personality;
use crate::microcode::{Condition, Operation, Source};

/// Data addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
    /// `(zp)`, 65C02 only.
    ZeroPageIndirect,
}

/// The shape of an opcode's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// An operation applied through a data addressing mode.
    Access(Operation, Mode),
    Implied(Operation),
    Accumulator(Operation),
    Branch(Condition),
    /// BBR/BBS: test a zero-page bit, then branch.
    BitBranch(Condition),
    Push(Source),
    /// PLA/PLX/PLY, finished by the matching load.
    Pull(Operation),
    PullStatus,
    Jsr,
    Rts,
    Rti,
    Brk,
    Jump,
    JumpIndirect,
    JumpIndexedIndirect,
    /// WAI/STP: two internal cycles, then the state change.
    Halt(Operation),
    /// 65C02 one-byte, one-cycle NOP.
    QuickNop,
    /// 65C02 `$5C`: three bytes, eight cycles.
    LongNop,
    Jam,
}

#[must_use]
pub fn decode(personality: Personality, opcode: u8) -> Instruction {
    if personality.is_cmos() {
        decode_cmos(personality, opcode)
    } else {
        decode_nmos(opcode)
    }
}

const ALU: [Operation; 8] = [
    Operation::Ora,
    Operation::And,
    Operation::Eor,
    Operation::Adc,
    Operation::Sta,
    Operation::Lda,
    Operation::Cmp,
    Operation::Sbc,
];

const SHIFT: [Operation; 8] = [
    Operation::Asl,
    Operation::Rol,
    Operation::Lsr,
    Operation::Ror,
    Operation::Stx,
    Operation::Ldx,
    Operation::Dec,
    Operation::Inc,
];

const COMBINED: [Operation; 8] = [
    Operation::Slo,
    Operation::Rla,
    Operation::Sre,
    Operation::Rra,
    Operation::Sax,
    Operation::Lax,
    Operation::Dcp,
    Operation::Isc,
];

const BRANCHES: [Condition; 8] = [
    Condition::Plus,
    Condition::Minus,
    Condition::OverflowClear,
    Condition::OverflowSet,
    Condition::CarryClear,
    Condition::CarrySet,
    Condition::NotEqual,
    Condition::Equal,
];

const FLAG_OPS: [Operation; 8] = [
    Operation::Clc,
    Operation::Sec,
    Operation::Cli,
    Operation::Sei,
    Operation::Tya,
    Operation::Clv,
    Operation::Cld,
    Operation::Sed,
];

/// `bbb` column for the `cc = 01` and `cc = 11` groups.
const GROUP_ONE_MODES: [Mode; 8] = [
    Mode::IndexedIndirect,
    Mode::ZeroPage,
    Mode::Immediate,
    Mode::Absolute,
    Mode::IndirectIndexed,
    Mode::ZeroPageX,
    Mode::AbsoluteY,
    Mode::AbsoluteX,
];

/// STX/LDX and SAX/LAX index by Y where everything else uses X.
const fn swap_index(operation: Operation, mode: Mode) -> Mode {
    match (operation, mode) {
        (
            Operation::Stx | Operation::Ldx | Operation::Sax | Operation::Lax,
            Mode::ZeroPageX,
        ) => Mode::ZeroPageY,
        (Operation::Ldx | Operation::Lax, Mode::AbsoluteX) => Mode::AbsoluteY,
        _ => mode,
    }
}

fn decode_nmos(opcode: u8) -> Instruction {
    let aaa = (opcode >> 5) as usize;
    let bbb = ((opcode >> 2) & 7) as usize;

    match opcode & 3 {
        0b01 => match opcode {
            // STA # doesn't exist; the slot reads an immediate and drops it
            0x89 => Instruction::Access(Operation::Nop, Mode::Immediate),
            _ => Instruction::Access(ALU[aaa], GROUP_ONE_MODES[bbb]),
        },
        0b10 => decode_nmos_shift(opcode, aaa, bbb),
        0b11 => decode_nmos_combined(opcode, aaa, bbb),
        _ => decode_control(opcode, aaa, bbb, false),
    }
}

fn decode_nmos_shift(opcode: u8, aaa: usize, bbb: usize) -> Instruction {
    let operation = SHIFT[aaa];
    match bbb {
        0 => match opcode {
            0xA2 => Instruction::Access(Operation::Ldx, Mode::Immediate),
            0x82 | 0xC2 | 0xE2 => Instruction::Access(Operation::Nop, Mode::Immediate),
            _ => Instruction::Jam,
        },
        1 => Instruction::Access(operation, Mode::ZeroPage),
        2 => match opcode {
            0x8A => Instruction::Implied(Operation::Txa),
            0xAA => Instruction::Implied(Operation::Tax),
            0xCA => Instruction::Implied(Operation::Dex),
            0xEA => Instruction::Implied(Operation::Nop),
            _ => Instruction::Accumulator(operation),
        },
        3 => Instruction::Access(operation, Mode::Absolute),
        4 => Instruction::Jam,
        5 => Instruction::Access(operation, swap_index(operation, Mode::ZeroPageX)),
        6 => match opcode {
            0x9A => Instruction::Implied(Operation::Txs),
            0xBA => Instruction::Implied(Operation::Tsx),
            _ => Instruction::Implied(Operation::Nop),
        },
        _ => match opcode {
            0x9E => Instruction::Access(Operation::Shx, Mode::AbsoluteY),
            _ => Instruction::Access(operation, swap_index(operation, Mode::AbsoluteX)),
        },
    }
}

fn decode_nmos_combined(opcode: u8, aaa: usize, bbb: usize) -> Instruction {
    match opcode {
        0x0B | 0x2B => Instruction::Access(Operation::Anc, Mode::Immediate),
        0x4B => Instruction::Access(Operation::Alr, Mode::Immediate),
        0x6B => Instruction::Access(Operation::Arr, Mode::Immediate),
        0x8B => Instruction::Access(Operation::Ane, Mode::Immediate),
        0xAB => Instruction::Access(Operation::Lxa, Mode::Immediate),
        0xCB => Instruction::Access(Operation::Sbx, Mode::Immediate),
        0xEB => Instruction::Access(Operation::Sbc, Mode::Immediate),
        0x93 => Instruction::Access(Operation::Sha, Mode::IndirectIndexed),
        0x9B => Instruction::Access(Operation::Shs, Mode::AbsoluteY),
        0x9F => Instruction::Access(Operation::Sha, Mode::AbsoluteY),
        0xBB => Instruction::Access(Operation::Las, Mode::AbsoluteY),
        _ => {
            let operation = COMBINED[aaa];
            Instruction::Access(operation, swap_index(operation, GROUP_ONE_MODES[bbb]))
        }
    }
}

/// The `cc = 00` group, shared by both families apart from the 65C02 slots.
fn decode_control(opcode: u8, aaa: usize, bbb: usize, cmos: bool) -> Instruction {
    match opcode {
        0x00 => Instruction::Brk,
        0x20 => Instruction::Jsr,
        0x40 => Instruction::Rti,
        0x60 => Instruction::Rts,
        0x4C => Instruction::Jump,
        0x6C => Instruction::JumpIndirect,
        0x08 => Instruction::Push(Source::StatusWithBreak),
        0x48 => Instruction::Push(Source::A),
        0x28 => Instruction::PullStatus,
        0x68 => Instruction::Pull(Operation::Lda),
        0x88 => Instruction::Implied(Operation::Dey),
        0xA8 => Instruction::Implied(Operation::Tay),
        0xC8 => Instruction::Implied(Operation::Iny),
        0xE8 => Instruction::Implied(Operation::Inx),
        0x24 => Instruction::Access(Operation::Bit, Mode::ZeroPage),
        0x2C => Instruction::Access(Operation::Bit, Mode::Absolute),
        0x84 => Instruction::Access(Operation::Sty, Mode::ZeroPage),
        0x8C => Instruction::Access(Operation::Sty, Mode::Absolute),
        0x94 => Instruction::Access(Operation::Sty, Mode::ZeroPageX),
        0xA0 => Instruction::Access(Operation::Ldy, Mode::Immediate),
        0xA4 => Instruction::Access(Operation::Ldy, Mode::ZeroPage),
        0xAC => Instruction::Access(Operation::Ldy, Mode::Absolute),
        0xB4 => Instruction::Access(Operation::Ldy, Mode::ZeroPageX),
        0xBC => Instruction::Access(Operation::Ldy, Mode::AbsoluteX),
        0xC0 => Instruction::Access(Operation::Cpy, Mode::Immediate),
        0xC4 => Instruction::Access(Operation::Cpy, Mode::ZeroPage),
        0xCC => Instruction::Access(Operation::Cpy, Mode::Absolute),
        0xE0 => Instruction::Access(Operation::Cpx, Mode::Immediate),
        0xE4 => Instruction::Access(Operation::Cpx, Mode::ZeroPage),
        0xEC => Instruction::Access(Operation::Cpx, Mode::Absolute),
        _ if bbb == 4 => Instruction::Branch(BRANCHES[aaa]),
        _ if bbb == 6 => Instruction::Implied(FLAG_OPS[aaa]),
        0x9C if !cmos => Instruction::Access(Operation::Shy, Mode::AbsoluteX),
        // Everything left is a NOP on NMOS, read through its mode
        _ => match bbb {
            0 => Instruction::Access(Operation::Nop, Mode::Immediate),
            1 => Instruction::Access(Operation::Nop, Mode::ZeroPage),
            3 => Instruction::Access(Operation::Nop, Mode::Absolute),
            5 => Instruction::Access(Operation::Nop, Mode::ZeroPageX),
            _ => Instruction::Access(Operation::Nop, Mode::AbsoluteX),
        },
    }
}

fn decode_cmos(personality: Personality, opcode: u8) -> Instruction {
    let aaa = (opcode >> 5) as usize;
    let bbb = ((opcode >> 2) & 7) as usize;
    let capabilities = personality.capabilities();

    match opcode {
        0x80 => Instruction::Branch(Condition::Always),
        0x89 => Instruction::Access(Operation::BitImmediate, Mode::Immediate),
        0x34 => Instruction::Access(Operation::Bit, Mode::ZeroPageX),
        0x3C => Instruction::Access(Operation::Bit, Mode::AbsoluteX),
        0x04 => Instruction::Access(Operation::Tsb, Mode::ZeroPage),
        0x0C => Instruction::Access(Operation::Tsb, Mode::Absolute),
        0x14 => Instruction::Access(Operation::Trb, Mode::ZeroPage),
        0x1C => Instruction::Access(Operation::Trb, Mode::Absolute),
        0x64 => Instruction::Access(Operation::Stz, Mode::ZeroPage),
        0x74 => Instruction::Access(Operation::Stz, Mode::ZeroPageX),
        0x9C => Instruction::Access(Operation::Stz, Mode::Absolute),
        0x9E => Instruction::Access(Operation::Stz, Mode::AbsoluteX),
        0x1A => Instruction::Accumulator(Operation::Inc),
        0x3A => Instruction::Accumulator(Operation::Dec),
        0x5A => Instruction::Push(Source::Y),
        0xDA => Instruction::Push(Source::X),
        0x7A => Instruction::Pull(Operation::Ldy),
        0xFA => Instruction::Pull(Operation::Ldx),
        0x7C => Instruction::JumpIndexedIndirect,
        0x5C => Instruction::LongNop,
        0x44 => Instruction::Access(Operation::Nop, Mode::ZeroPage),
        0x54 | 0xD4 | 0xF4 => Instruction::Access(Operation::Nop, Mode::ZeroPageX),
        0xDC | 0xFC => Instruction::Access(Operation::Nop, Mode::Absolute),
        0xCB if capabilities.wait_and_stop => Instruction::Halt(Operation::Wai),
        0xDB if capabilities.wait_and_stop => Instruction::Halt(Operation::Stp),
        _ => match opcode & 3 {
            0b01 => Instruction::Access(ALU[aaa], GROUP_ONE_MODES[bbb]),
            0b10 => match bbb {
                0 if opcode == 0xA2 => Instruction::Access(Operation::Ldx, Mode::Immediate),
                0 => Instruction::Access(Operation::Nop, Mode::Immediate),
                4 => Instruction::Access(ALU[aaa], Mode::ZeroPageIndirect),
                _ => decode_nmos_shift(opcode, aaa, bbb),
            },
            0b11 => decode_cmos_bit_column(opcode, capabilities.bit_operations),
            _ => decode_control(opcode, aaa, bbb, true),
        },
    }
}

/// Columns 3, 7, B and F: Rockwell bit instructions or one-cycle NOPs.
fn decode_cmos_bit_column(opcode: u8, bit_operations: bool) -> Instruction {
    let bit = (opcode >> 4) & 7;
    let set = opcode & 0x80 != 0;
    match opcode & 0x0F {
        0x07 if bit_operations => {
            let operation = if set {
                Operation::Smb(bit)
            } else {
                Operation::Rmb(bit)
            };
            Instruction::Access(operation, Mode::ZeroPage)
        }
        0x0F if bit_operations => Instruction::BitBranch(if set {
            Condition::BitSet(bit)
        } else {
            Condition::BitClear(bit)
        }),
        _ => Instruction::QuickNop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NMOS: Personality = Personality::Nmos6502;
    const WDC: Personality = Personality::Wdc65C02;

    #[test]
    fn documented_group_one() {
        assert_eq!(
            decode(NMOS, 0xA9),
            Instruction::Access(Operation::Lda, Mode::Immediate)
        );
        assert_eq!(
            decode(NMOS, 0x91),
            Instruction::Access(Operation::Sta, Mode::IndirectIndexed)
        );
        assert_eq!(
            decode(NMOS, 0x7D),
            Instruction::Access(Operation::Adc, Mode::AbsoluteX)
        );
    }

    #[test]
    fn index_register_swaps() {
        assert_eq!(
            decode(NMOS, 0xB6),
            Instruction::Access(Operation::Ldx, Mode::ZeroPageY)
        );
        assert_eq!(
            decode(NMOS, 0xBE),
            Instruction::Access(Operation::Ldx, Mode::AbsoluteY)
        );
        assert_eq!(
            decode(NMOS, 0x97),
            Instruction::Access(Operation::Sax, Mode::ZeroPageY)
        );
        assert_eq!(
            decode(NMOS, 0xBF),
            Instruction::Access(Operation::Lax, Mode::AbsoluteY)
        );
    }

    #[test]
    fn nmos_has_twelve_jams() {
        let jams: Vec<u8> = (0..=0xFFu8)
            .filter(|&op| decode(NMOS, op) == Instruction::Jam)
            .collect();
        assert_eq!(
            jams,
            [0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2]
        );
    }

    #[test]
    fn cmos_never_jams() {
        for personality in [
            Personality::Synertek65C02,
            Personality::Rockwell65C02,
            Personality::Wdc65C02,
        ] {
            for opcode in 0..=0xFFu8 {
                assert_ne!(decode(personality, opcode), Instruction::Jam);
            }
        }
    }

    #[test]
    fn cmos_additions() {
        assert_eq!(
            decode(WDC, 0xB2),
            Instruction::Access(Operation::Lda, Mode::ZeroPageIndirect)
        );
        assert_eq!(decode(WDC, 0x80), Instruction::Branch(Condition::Always));
        assert_eq!(decode(WDC, 0xCB), Instruction::Halt(Operation::Wai));
        assert_eq!(decode(WDC, 0xFF), Instruction::BitBranch(Condition::BitSet(7)));
        assert_eq!(
            decode(WDC, 0x17),
            Instruction::Access(Operation::Rmb(1), Mode::ZeroPage)
        );
        assert_eq!(decode(Personality::Rockwell65C02, 0xCB), Instruction::QuickNop);
        assert_eq!(decode(Personality::Synertek65C02, 0x87), Instruction::QuickNop);
    }

    #[test]
    fn nmos_unstable_stores() {
        assert_eq!(
            decode(NMOS, 0x9C),
            Instruction::Access(Operation::Shy, Mode::AbsoluteX)
        );
        assert_eq!(
            decode(NMOS, 0x9E),
            Instruction::Access(Operation::Shx, Mode::AbsoluteY)
        );
        assert_eq!(
            decode(NMOS, 0x93),
            Instruction::Access(Operation::Sha, Mode::IndirectIndexed)
        );
    }
}
