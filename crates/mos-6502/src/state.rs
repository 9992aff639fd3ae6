//! Save states.
//!
//! A core can be captured between any two bus cycles, including mid
//! instruction or with a cycle debt outstanding. Everything needed to
//! continue is plain data; the program tables are rebuilt from the
//! personality, so a cursor is just a program name and a step index.

use emu_core::Cycles;
use thiserror::Error;

use crate::cpu::{Latches, Mos6502, RunState};
use crate::interrupts::Interrupts;
use crate::programs::{Cursor, ProgramId, ProgramTable};
use crate::{Config, Personality, Registers, Transaction};

/// Complete execution state of a [`Mos6502`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuState {
    pub personality: Personality,
    pub ready_line: bool,
    pub registers: Registers,
    pub latches: Latches,
    pub interrupts: Interrupts,
    pub run_state: RunState,
    pub cursor: Option<Cursor>,
    pub resume: Option<Cursor>,
    pub pending: Option<Transaction>,
    pub last_operation_address: u16,
    pub last_bus_address: u16,
    pub cycles_left: i64,
    pub total_cycles: Cycles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("state was saved from a {saved:?} core, not {expected:?}")]
    PersonalityMismatch {
        saved: Personality,
        expected: Personality,
    },
    #[error("cursor {0:?} is outside its program")]
    InvalidCursor(Cursor),
    #[error("resume point {0:?} is not behind a continuation")]
    StrayResume(Cursor),
}

impl Mos6502 {
    #[must_use]
    pub fn save_state(&self) -> CpuState {
        CpuState {
            personality: self.config.personality,
            ready_line: self.config.ready_line,
            registers: self.regs,
            latches: self.latches,
            interrupts: self.interrupts,
            run_state: self.state,
            cursor: self.cursor,
            resume: self.resume,
            pending: self.pending,
            last_operation_address: self.last_operation_address,
            last_bus_address: self.last_bus_address,
            cycles_left: self.cycles_left,
            total_cycles: self.total_cycles,
        }
    }

    /// Overwrite this core with `state`. The core is left untouched if the
    /// state belongs to another personality or names a step that doesn't
    /// exist.
    pub fn restore_state(&mut self, state: &CpuState) -> Result<(), StateError> {
        if state.personality != self.config.personality {
            return Err(StateError::PersonalityMismatch {
                saved: state.personality,
                expected: self.config.personality,
            });
        }
        validate(self.programs, state)?;

        self.config.ready_line = state.ready_line;
        self.regs = state.registers;
        self.latches = state.latches;
        self.interrupts = state.interrupts;
        self.state = state.run_state;
        self.cursor = state.cursor;
        self.resume = state.resume;
        self.pending = state.pending;
        self.last_operation_address = state.last_operation_address;
        self.last_bus_address = state.last_bus_address;
        self.cycles_left = state.cycles_left;
        self.total_cycles = state.total_cycles;
        log::debug!(
            "restored {} core at ${:04X}, cycle {}",
            state.personality.name(),
            state.registers.pc,
            state.total_cycles.get()
        );
        Ok(())
    }

    /// Build a new core directly from a saved state.
    pub fn from_state(state: &CpuState) -> Result<Self, StateError> {
        let mut config = Config::new(state.personality);
        config.ready_line = state.ready_line;
        let mut cpu = Self::with_config(config);
        cpu.restore_state(state)?;
        Ok(cpu)
    }
}

fn validate(programs: &ProgramTable, state: &CpuState) -> Result<(), StateError> {
    for cursor in [state.cursor, state.resume].into_iter().flatten() {
        if !programs.contains(cursor) {
            return Err(StateError::InvalidCursor(cursor));
        }
    }
    // Only a spliced continuation leaves a resume point, and they never nest
    if let Some(resume) = state.resume {
        let spliced = state
            .cursor
            .is_some_and(|cursor| is_continuation(cursor.program));
        if !spliced || is_continuation(resume.program) {
            return Err(StateError::StrayResume(resume));
        }
    }
    Ok(())
}

const fn is_continuation(program: ProgramId) -> bool {
    matches!(
        program,
        ProgramId::PageFix
            | ProgramId::BranchTaken
            | ProgramId::BranchCrossed
            | ProgramId::DecimalFixup
    )
}
