//! Integration tests using Tom Harte's `SingleStepTests` for the 65x02
//! family.
//!
//! Each opcode file holds 10,000 cases giving the state before and after
//! one instruction plus every bus cycle in between. Cases are compared on
//! registers, memory and the cycle-by-cycle bus trace.
//!
//! Test data lives in `test-data/65x02/<variant>/v1/XX.json`.

use emu_core::{Bus, BusOperation, Cpu, Cycles, SimpleBus};
use mos_6502::{Mos6502, Personality};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat 64KB RAM bus that records every cycle.
struct TestBus {
    ram: SimpleBus,
    cycles: Vec<(u16, u8, &'static str)>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            ram: SimpleBus::new(),
            cycles: Vec::new(),
        }
    }

    fn load_ram(&mut self, entries: &[(u16, u8)]) {
        for &(addr, value) in entries {
            self.ram.poke(addr, value);
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.ram.peek(addr)
    }
}

impl Bus for TestBus {
    fn perform(&mut self, operation: BusOperation, address: u16, value: &mut u8) -> Cycles {
        let cycles = self.ram.perform(operation, address, value);
        let kind = if operation.is_write() { "write" } else { "read" };
        self.cycles.push((address, *value, kind));
        cycles
    }
}

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<(u16, u8, String)>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

/// Bring a core out of reset with its first opcode fetch pending at the
/// initial PC, then load registers and memory.
fn setup(personality: Personality, state: &CpuState) -> (Mos6502, TestBus) {
    let mut scratch = SimpleBus::new();
    scratch.load(0xFFFC, &state.pc.to_le_bytes());
    let mut cpu = Mos6502::new(personality);
    cpu.run_for(&mut scratch, Cycles(7));

    cpu.regs.s = state.s;
    cpu.regs.a = state.a;
    cpu.regs.x = state.x;
    cpu.regs.y = state.y;
    cpu.set_flags(state.p);

    let mut bus = TestBus::new();
    bus.load_ram(&state.ram);
    (cpu, bus)
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &Mos6502, bus: &TestBus, test: &TestCase) -> Vec<String> {
    let expected = &test.final_state;
    let mut errors = Vec::new();

    let registers = [
        ("PC", cpu.regs.pc, expected.pc),
        ("S", u16::from(cpu.regs.s), u16::from(expected.s)),
        ("A", u16::from(cpu.regs.a), u16::from(expected.a)),
        ("X", u16::from(cpu.regs.x), u16::from(expected.x)),
        ("Y", u16::from(cpu.regs.y), u16::from(expected.y)),
    ];
    for (name, got, want) in registers {
        if got != want {
            errors.push(format!("{name}: got ${got:04X}, want ${want:04X}"));
        }
    }

    // B and U have no storage outside a pushed copy
    let actual_p = cpu.get_flags() | 0x30;
    let expected_p = expected.p | 0x30;
    if actual_p != expected_p {
        errors.push(format!(
            "P: got ${actual_p:02X} ({actual_p:08b}), want ${expected_p:02X} ({expected_p:08b})"
        ));
    }

    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.peek(addr);
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    for (i, (got, want)) in bus.cycles.iter().zip(&test.cycles).enumerate() {
        if got.0 != want.0 || got.1 != want.1 || got.2 != want.2 {
            errors.push(format!(
                "cycle {i}: got ${:04X} ${:02X} {}, want ${:04X} ${:02X} {}",
                got.0, got.1, got.2, want.0, want.1, want.2
            ));
            break;
        }
    }

    errors
}

fn test_dir(variant: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/65x02")
        .join(variant)
        .join("v1")
}

fn run_all(personality: Personality, variant: &str) {
    let test_dir = test_dir(variant);
    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for opcode in 0..=0xFF_u8 {
        let filename = format!("{opcode:02x}.json");
        let path = test_dir.join(&filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let (mut cpu, mut bus) = setup(personality, &test.initial);
            cpu.run_for(&mut bus, Cycles(test.cycles.len() as u64));

            let errors = compare(&cpu, &bus, test);
            if errors.is_empty() {
                file_pass += 1;
            } else {
                file_fail += 1;
                if first_failures.len() < 5 {
                    first_failures.push(format!(
                        "  FAIL [{}]: {}",
                        test.name,
                        errors.join(", ")
                    ));
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!(
            "{} ${opcode:02X} ({filename}): {status}, {file_pass}/{} passed",
            personality.name(),
            file_pass + file_fail
        );
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== SingleStepTests Summary ({}) ===", personality.name());
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}

#[test]
#[ignore = "requires test-data/65x02, run with --ignored"]
fn nmos_6502() {
    run_all(Personality::Nmos6502, "6502");
}

#[test]
#[ignore = "requires test-data/65x02, run with --ignored"]
fn ricoh_2a03() {
    run_all(Personality::Ricoh2A03, "nes6502");
}

#[test]
#[ignore = "requires test-data/65x02, run with --ignored"]
fn synertek_65c02() {
    run_all(Personality::Synertek65C02, "synertek65c02");
}

#[test]
#[ignore = "requires test-data/65x02, run with --ignored"]
fn rockwell_65c02() {
    run_all(Personality::Rockwell65C02, "rockwell65c02");
}

#[test]
#[ignore = "requires test-data/65x02, run with --ignored"]
fn wdc_65c02() {
    run_all(Personality::Wdc65C02, "wdc65c02");
}
