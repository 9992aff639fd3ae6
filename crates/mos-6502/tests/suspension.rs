//! Suspending and resuming execution at arbitrary cycle boundaries.

mod common;

use common::{ORIGIN, SlowBus, boot};
use emu_core::{Access, BusOperation, Cpu, Cycles, SimpleBus};
use mos_6502::{Mos6502, Personality};

/// A loop that exercises most program shapes: indexed page crossings,
/// read-modify-write, the stack, subroutines and both kinds of branch.
const WORKOUT: &[u8] = &[
    0xA2, 0x00, // $0200 LDX #$00
    0xBD, 0xF0, 0x12, // $0202 LDA $12F0,X
    0x7D, 0xF8, 0x12, // $0205 ADC $12F8,X
    0x9D, 0x00, 0x30, // $0208 STA $3000,X
    0xFE, 0x00, 0x31, // $020B INC $3100,X
    0x48, // $020E PHA
    0x20, 0x30, 0x02, // $020F JSR $0230
    0x68, // $0212 PLA
    0xE8, // $0213 INX
    0xE0, 0x20, // $0214 CPX #$20
    0xD0, 0xEA, // $0216 BNE $0202
    0xF8, // $0218 SED
    0x4C, 0x00, 0x02, // $0219 JMP $0200
];

/// Subroutine at $0230.
const SUBROUTINE: &[u8] = &[
    0xB1, 0x40, // LDA ($40),Y
    0xC8, // INY
    0x60, // RTS
];

fn workout(personality: Personality) -> (Mos6502, SimpleBus) {
    let (cpu, mut bus) = boot(personality, WORKOUT);
    bus.load(0x0230, SUBROUTINE);
    bus.load(0x0040, &[0xC0, 0x20]);
    for i in 0..0x40u16 {
        bus.poke(0x12E0 + i, (i * 7) as u8);
    }
    bus.record();
    (cpu, bus)
}

/// Deterministic chunk sizes between 0 and 6.
fn chunks(seed: u32) -> impl Iterator<Item = u64> {
    let mut state = seed;
    std::iter::from_fn(move || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        Some(u64::from((state >> 16) % 7))
    })
}

fn run_in_chunks(cpu: &mut Mos6502, bus: &mut SimpleBus, total: u64, seed: u32) {
    let mut run = 0;
    for chunk in chunks(seed) {
        if run >= total {
            break;
        }
        let chunk = chunk.min(total - run);
        let consumed = cpu.run_for(bus, Cycles(chunk));
        assert_eq!(consumed, Cycles(chunk), "unit-cycle bus never overshoots");
        run += chunk;
    }
}

#[test]
fn test_partitioning_does_not_change_behavior() {
    const TOTAL: u64 = 3_000;

    for personality in Personality::ALL {
        let (mut reference, mut reference_bus) = workout(personality);
        reference.run_for(&mut reference_bus, Cycles(TOTAL));
        let expected: Vec<Access> = reference_bus.take_trace();
        assert_eq!(expected.len() as u64, TOTAL);

        for seed in [1, 7, 42, 1234] {
            let (mut cpu, mut bus) = workout(personality);
            run_in_chunks(&mut cpu, &mut bus, TOTAL, seed);

            assert_eq!(bus.trace(), expected.as_slice(), "{personality:?} seed {seed}");
            assert_eq!(cpu.save_state(), reference.save_state(), "{personality:?} seed {seed}");
        }
    }
}

#[test]
fn test_single_cycle_steps_match_bulk_run() {
    let (mut reference, mut reference_bus) = workout(Personality::Nmos6502);
    reference.run_for(&mut reference_bus, Cycles(500));

    let (mut cpu, mut bus) = workout(Personality::Nmos6502);
    for _ in 0..500 {
        cpu.run_for(&mut bus, Cycles::ONE);
    }

    assert_eq!(bus.trace(), reference_bus.trace());
    assert_eq!(cpu.regs, reference.regs);
}

#[test]
fn test_zero_budget_performs_nothing() {
    let (mut cpu, mut bus) = workout(Personality::Wdc65C02);

    let advance = cpu.advance(&mut bus, Cycles::ZERO);
    assert_eq!(advance.consumed, Cycles::ZERO);
    assert!(bus.trace().is_empty());
    let pending = advance.pending.expect("first fetch is pending");
    assert_eq!(pending.operation, BusOperation::ReadOpcode);
    assert_eq!(pending.address, ORIGIN);
}

#[test]
fn test_stretched_cycles_are_owed() {
    // LDA $4000; NOP
    let (mut cpu, inner) = boot(Personality::Nmos6502, &[0xAD, 0x00, 0x40, 0xEA]);
    let mut bus = SlowBus {
        inner,
        slow_address: 0x4000,
        extra: 2,
    };

    // Opcode and both operand bytes
    assert_eq!(cpu.advance(&mut bus, Cycles(3)).consumed, Cycles(3));

    // The data read takes three cycles against a budget of one
    let advance = cpu.advance(&mut bus, Cycles(1));
    assert_eq!(advance.consumed, Cycles(3));
    assert!(advance.pending.is_some_and(|t| t.is_opcode_fetch()));

    // The overshoot is paid back before anything else happens
    assert_eq!(cpu.advance(&mut bus, Cycles(1)).consumed, Cycles::ZERO);
    assert_eq!(cpu.advance(&mut bus, Cycles(1)).consumed, Cycles::ZERO);
    assert_eq!(cpu.advance(&mut bus, Cycles(1)).consumed, Cycles(1));
    assert_eq!(cpu.total_cycles(), Cycles(7 + 3 + 3 + 1));
}

#[test]
fn test_pending_transaction_matches_next_access() {
    let (mut cpu, mut bus) = workout(Personality::Synertek65C02);

    for step in 0..200 {
        let pending = cpu.pending_transaction().expect("always a pending access");
        cpu.run_for(&mut bus, Cycles::ONE);
        let performed = *bus.trace().last().expect("one access per cycle");
        assert_eq!(performed.address, pending.address, "step {step}");
        assert_eq!(performed.operation, pending.operation, "step {step}");
        if pending.operation == BusOperation::Write {
            assert_eq!(performed.value, pending.value, "step {step}");
        }
    }
}
