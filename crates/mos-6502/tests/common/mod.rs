//! Shared helpers for the integration tests.

#![allow(dead_code)]

use emu_core::{Bus, BusOperation, Cpu, Cycles, SimpleBus};
use mos_6502::{Config, Mos6502, Personality};

/// Where test programs are loaded. The reset vector points here.
pub const ORIGIN: u16 = 0x0200;

/// Power on a core with `program` at [`ORIGIN`] and run the reset sequence.
///
/// The core is left with the first opcode fetch pending: S=$FD, I set.
pub fn boot(personality: Personality, program: &[u8]) -> (Mos6502, SimpleBus) {
    boot_with(Config::new(personality), program)
}

pub fn boot_with(config: Config, program: &[u8]) -> (Mos6502, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFC, &ORIGIN.to_le_bytes());
    bus.load(ORIGIN, program);
    let mut cpu = Mos6502::with_config(config);
    let consumed = cpu.run_for(&mut bus, Cycles(7));
    assert_eq!(consumed, Cycles(7));
    assert_eq!(cpu.pc(), u32::from(ORIGIN), "reset should land at the origin");
    assert!(cpu.is_at_instruction_boundary());
    (cpu, bus)
}

/// Run one complete instruction (fetch + execute cycles), one cycle at a
/// time. Returns the cycles it took.
pub fn run_instruction<B: Bus>(cpu: &mut Mos6502, bus: &mut B) -> u64 {
    let start = cpu.total_cycles();
    // First cycle is the opcode fetch
    cpu.run_for(bus, Cycles::ONE);

    for _ in 0..20 {
        if cpu.is_at_instruction_boundary() {
            return (cpu.total_cycles() - start).get();
        }
        cpu.run_for(bus, Cycles::ONE);
    }
    panic!(
        "Instruction did not complete within 20 cycles (PC=${:04X})",
        cpu.pc()
    );
}

pub fn run_instructions<B: Bus>(cpu: &mut Mos6502, bus: &mut B, count: usize) {
    for _ in 0..count {
        run_instruction(cpu, bus);
    }
}

/// Bus wrapper that stretches every access to a given address.
pub struct SlowBus {
    pub inner: SimpleBus,
    pub slow_address: u16,
    pub extra: u64,
}

impl Bus for SlowBus {
    fn perform(&mut self, operation: BusOperation, address: u16, value: &mut u8) -> Cycles {
        let cycles = self.inner.perform(operation, address, value);
        if address == self.slow_address && operation != BusOperation::Ready {
            cycles + Cycles(self.extra)
        } else {
            cycles
        }
    }
}
