//! Cycle-accurate 6502 family CPU core.
//!
//! The core runs against a host [`emu_core::Bus`] one transaction at a
//! time. Every instruction is a short program of micro-ops; a cursor into
//! those programs plus a single pending transaction is all the execution
//! state there is. That lets [`Mos6502::advance`] stop after any number of
//! cycles, with the next bus access visible before it happens, and lets a
//! save state capture the core mid-instruction.
//!
//! One implementation covers the NMOS 6502 (with undocumented opcodes), the
//! Ricoh 2A03 and the Synertek, Rockwell and WDC 65C02 variants. See
//! [`Personality`].

mod addressing;
mod alu;
mod cpu;
pub mod flags;
mod interrupts;
mod microcode;
mod opcodes;
mod personality;
mod programs;
mod registers;
mod state;
mod transaction;

pub use alu::Arithmetic;
pub use cpu::{Advance, Latches, Mos6502, RunState};
pub use flags::FlagBank;
pub use interrupts::{Interrupts, Lines, Requests};
pub use microcode::{Condition, Index, MicroOp, Operation, Source, Target, Vector, Wrap};
pub use opcodes::{Instruction, Mode, decode};
pub use personality::{Capabilities, Config, Personality};
pub use programs::{Cursor, ProgramId, ProgramTable};
pub use registers::{Register, Registers};
pub use state::{CpuState, StateError};
pub use transaction::Transaction;
