//! 6502 CPU implementation.
//!
//! Cycle-accurate emulation driven by micro-op programs. A cursor into the
//! program tables is the whole of "where execution is", so the core can
//! stop between any two bus cycles and resume later from plain data.

use emu_core::{Bus, BusOperation, Cpu, Cycles, Observable, Value};

use crate::alu::Arithmetic;
use crate::flags::{C, D, I, N, V, Z};
use crate::interrupts::{Interrupts, Requests};
use crate::microcode::{Index, MicroOp, Operation, Source, Target, Vector, Wrap};
use crate::programs::{self, Cursor, ProgramId, ProgramTable};
use crate::{Config, Personality, Register, Registers, Transaction};

/// What the core is doing at the level the arbiter cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    Running,
    EnteringReset,
    EnteringNmi,
    EnteringIrq,
    /// Undefined NMOS opcode. Only reset or a forced return gets out.
    Jammed,
    /// WAI: idle until NMI or the IRQ line.
    Waiting,
    /// STP: idle until reset.
    Stopped,
}

impl RunState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::EnteringReset => "reset",
            Self::EnteringNmi => "nmi",
            Self::EnteringIrq => "irq",
            Self::Jammed => "jammed",
            Self::Waiting => "waiting",
            Self::Stopped => "stopped",
        }
    }
}

/// Internal latches that instruction programs work through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Latches {
    pub opcode: u8,
    /// Data byte: the value read, or the value about to be written.
    pub operand: u8,
    /// Effective address (or branch target).
    pub address: u16,
    pub pointer: u16,
    /// Address high byte before indexing.
    pub base_high: u8,
    /// The last `IndexLow` carried out of the low byte.
    pub page_crossed: bool,
    pub bit_test: u8,
    pub vector: u16,
}

/// Result of [`Mos6502::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub consumed: Cycles,
    /// The transaction the next cycle will perform.
    pub pending: Option<Transaction>,
}

/// A 6502-family CPU.
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,
    pub(crate) config: Config,
    pub(crate) programs: &'static ProgramTable,
    pub(crate) cursor: Option<Cursor>,
    /// Where to continue after a spliced continuation finishes.
    pub(crate) resume: Option<Cursor>,
    pub(crate) pending: Option<Transaction>,
    pub(crate) state: RunState,
    pub(crate) interrupts: Interrupts,
    pub(crate) latches: Latches,
    pub(crate) last_operation_address: u16,
    pub(crate) last_bus_address: u16,
    /// Budget still owed. Negative when the bus stretched a cycle past the
    /// end of the previous budget.
    pub(crate) cycles_left: i64,
    pub(crate) total_cycles: Cycles,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new(Personality::default())
    }
}

impl Mos6502 {
    /// Create a powered-on core. The first thing it runs is the reset
    /// sequence.
    #[must_use]
    pub fn new(personality: Personality) -> Self {
        Self::with_config(Config::new(personality))
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            regs: Registers::new(),
            config,
            programs: ProgramTable::for_personality(config.personality),
            cursor: None,
            resume: None,
            pending: None,
            state: RunState::Running,
            interrupts: Interrupts::new(),
            latches: Latches::default(),
            last_operation_address: 0,
            last_bus_address: 0,
            cycles_left: 0,
            total_cycles: Cycles::ZERO,
        }
    }

    #[must_use]
    pub const fn personality(&self) -> Personality {
        self.config.personality
    }

    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Run for `budget` cycles.
    ///
    /// Stops with the next transaction scheduled but not performed. Cycles
    /// the bus adds beyond the budget are owed by the next call.
    pub fn advance<B: Bus>(&mut self, bus: &mut B, budget: Cycles) -> Advance {
        let start = self.total_cycles;
        self.cycles_left = self.cycles_left.saturating_add(signed(budget));
        loop {
            self.schedule();
            if self.cycles_left <= 0 {
                break;
            }
            self.perform(bus);
        }
        Advance {
            consumed: self.total_cycles - start,
            pending: self.pending,
        }
    }

    #[must_use]
    pub const fn pending_transaction(&self) -> Option<Transaction> {
        self.pending
    }

    #[must_use]
    pub const fn total_cycles(&self) -> Cycles {
        self.total_cycles
    }

    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub const fn is_jammed(&self) -> bool {
        matches!(self.state, RunState::Jammed)
    }

    /// True when the next cycle is an opcode fetch.
    #[must_use]
    pub fn is_at_instruction_boundary(&self) -> bool {
        match self.pending {
            Some(transaction) => transaction.is_opcode_fetch(),
            None => self.cursor.is_none(),
        }
    }

    // ========================================================================
    // Line control
    // ========================================================================

    /// Drive RDY. While held, reads (and on the 65C02, writes too) are
    /// replaced by ready polls and the core makes no progress.
    ///
    /// # Panics
    ///
    /// If the core was not configured with a ready line.
    pub fn set_ready_line(&mut self, active: bool) {
        assert!(
            self.config.ready_line,
            "{} core was built without a ready line",
            self.config.personality.name()
        );
        self.interrupts.lines.ready = active;
    }

    /// Drive SO. A rising edge sets V.
    pub fn set_overflow_line(&mut self, active: bool) {
        if self.interrupts.set_overflow_line(active) {
            self.regs.flags.set_overflow(true);
        }
    }

    // ========================================================================
    // Debug surface
    // ========================================================================

    #[must_use]
    pub fn get_register(&self, register: Register) -> u16 {
        match register {
            Register::ProgramCounter => self.regs.pc,
            Register::LastOperationAddress => self.last_operation_address,
            Register::StackPointer => u16::from(self.regs.s),
            Register::Flags => u16::from(self.regs.flags.packed()),
            Register::A => u16::from(self.regs.a),
            Register::X => u16::from(self.regs.x),
            Register::Y => u16::from(self.regs.y),
        }
    }

    /// Poke a register. 8-bit registers take the low byte.
    ///
    /// Moving PC while the next opcode fetch is already scheduled redirects
    /// that fetch.
    pub fn set_register(&mut self, register: Register, value: u16) {
        match register {
            Register::ProgramCounter => {
                self.regs.pc = value;
                if self.pending.is_some_and(|t| t.is_opcode_fetch()) {
                    self.pending = None;
                    self.cursor = Some(Cursor::start(ProgramId::FetchDecode));
                }
            }
            Register::LastOperationAddress => {
                log::debug!("ignoring write to read-only LastOperationAddress");
            }
            Register::StackPointer => self.regs.s = value as u8,
            Register::Flags => self.regs.flags.apply(value as u8),
            Register::A => self.regs.a = value as u8,
            Register::X => self.regs.x = value as u8,
            Register::Y => self.regs.y = value as u8,
        }
    }

    #[must_use]
    pub fn get_flags(&self) -> u8 {
        self.regs.flags.packed()
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.regs.flags.apply(flags);
    }

    /// Pop a return address as RTS would and continue from the byte after
    /// it. Abandons whatever was in progress, including a jam.
    pub fn force_return_from_subroutine(&mut self) {
        if self.state == RunState::Jammed {
            log::debug!("forced return out of jam at ${:04X}", self.regs.pc);
        }
        self.pending = None;
        self.resume = None;
        self.cursor = Some(Cursor::start(ProgramId::ForcedReturn));
        self.state = RunState::Running;
    }

    // ========================================================================
    // Scheduler
    // ========================================================================

    /// Run steps until one schedules a bus transaction.
    fn schedule(&mut self) {
        let programs = self.programs;
        while self.pending.is_none() {
            let cursor = match self.cursor {
                Some(cursor) => cursor,
                None => {
                    let cursor = self.arbitrate();
                    self.cursor = Some(cursor);
                    cursor
                }
            };
            match programs.get(cursor.program).get(cursor.step) {
                Some(&step) => {
                    self.cursor = Some(Cursor {
                        step: cursor.step + 1,
                        ..cursor
                    });
                    self.run_step(step);
                }
                None => self.cursor = self.resume.take(),
            }
        }
    }

    fn perform<B: Bus>(&mut self, bus: &mut B) {
        let Some(mut transaction) = self.pending else {
            return;
        };

        if self.interrupts.lines.ready
            && (transaction.operation.is_read() || self.config.personality.is_cmos())
        {
            let mut ignored = transaction.value;
            let cycles = bus.perform(BusOperation::Ready, transaction.address, &mut ignored);
            self.spend(cycles.max(Cycles::ONE));
            return;
        }

        if transaction.samples_interrupts {
            self.interrupts
                .sample(self.regs.flags.interrupt_disable());
        }
        let cycles = bus.perform(
            transaction.operation,
            transaction.address,
            &mut transaction.value,
        );
        self.pending = None;
        self.last_bus_address = transaction.address;
        if transaction.operation.is_read() {
            self.store(transaction.target, transaction.value);
        }
        self.spend(cycles);
    }

    fn spend(&mut self, cycles: Cycles) {
        self.cycles_left = self.cycles_left.saturating_sub(signed(cycles));
        self.total_cycles += cycles;
    }

    /// Pick the next program at an instruction boundary.
    fn arbitrate(&mut self) -> Cursor {
        let sampled = self.interrupts.sampled;

        if sampled.intersects(Requests::POWER_ON.union(Requests::RESET)) {
            self.interrupts.acknowledge_reset();
            log::debug!("{} reset from {}", self.personality().name(), self.state.name());
            self.state = RunState::EnteringReset;
            return Cursor::start(ProgramId::Reset);
        }

        match self.state {
            RunState::Jammed => return Cursor::start(ProgramId::Jam),
            RunState::Stopped => return Cursor::start(ProgramId::Stop),
            RunState::Waiting => {
                if !sampled.contains(Requests::NMI) && !self.interrupts.lines.irq {
                    return Cursor::start(ProgramId::Wait);
                }
                log::debug!("leaving WAI at ${:04X}", self.regs.pc);
            }
            _ => {}
        }

        if sampled.contains(Requests::NMI) {
            self.interrupts.acknowledge_nmi();
            log::trace!("NMI at ${:04X}", self.regs.pc);
            self.state = RunState::EnteringNmi;
            Cursor::start(ProgramId::Nmi)
        } else if sampled.contains(Requests::IRQ) {
            log::trace!("IRQ at ${:04X}", self.regs.pc);
            self.state = RunState::EnteringIrq;
            Cursor::start(ProgramId::Irq)
        } else {
            self.state = RunState::Running;
            Cursor::start(ProgramId::FetchDecode)
        }
    }

    /// Start `program` now. Mid-program, the rest of the current program
    /// resumes once it ends; at the tail it simply replaces it.
    fn splice(&mut self, program: ProgramId) {
        if let Some(cursor) = self.cursor
            && cursor.step < self.programs.get(cursor.program).len()
        {
            debug_assert!(self.resume.is_none(), "continuations do not nest");
            self.resume = Some(cursor);
        }
        self.cursor = Some(Cursor::start(program));
    }

    fn issue(&mut self, transaction: Transaction) {
        self.pending = Some(transaction);
    }

    fn read(&mut self, address: u16, target: Target) {
        self.issue(Transaction::read(address, target));
    }

    fn write(&mut self, address: u16, value: u8) {
        self.issue(Transaction::write(address, value));
    }

    fn store(&mut self, target: Target, value: u8) {
        let latches = &mut self.latches;
        match target {
            Target::Discard => {}
            Target::Opcode => latches.opcode = value,
            Target::Operand => latches.operand = value,
            Target::Address => latches.address = u16::from(value),
            Target::AddressHigh => {
                latches.address = (latches.address & 0x00FF) | (u16::from(value) << 8);
            }
            Target::Pointer => latches.pointer = u16::from(value),
            Target::PointerHigh => {
                latches.pointer = (latches.pointer & 0x00FF) | (u16::from(value) << 8);
            }
            Target::PcLow => self.regs.pc = (self.regs.pc & 0xFF00) | u16::from(value),
            Target::PcHigh => {
                self.regs.pc = (self.regs.pc & 0x00FF) | (u16::from(value) << 8);
            }
            Target::Flags => self.regs.flags.apply(value),
            Target::BitTest => latches.bit_test = value,
        }
    }

    fn source(&self, source: Source) -> u8 {
        match source {
            Source::A => self.regs.a,
            Source::X => self.regs.x,
            Source::Y => self.regs.y,
            Source::PcHigh => (self.regs.pc >> 8) as u8,
            Source::PcLow => self.regs.pc as u8,
            Source::StatusWithBreak => self.regs.flags.packed_with_break(),
            Source::Status => self.regs.flags.packed(),
        }
    }

    const fn index(&self, index: Index) -> u8 {
        match index {
            Index::X => self.regs.x,
            Index::Y => self.regs.y,
        }
    }

    fn run_step(&mut self, step: MicroOp) {
        let pc = self.regs.pc;
        match step {
            MicroOp::FetchOpcode => self.issue(Transaction {
                operation: BusOperation::ReadOpcode,
                ..Transaction::read(pc, Target::Opcode)
            }),
            MicroOp::FetchPc(target) => {
                self.regs.pc = pc.wrapping_add(1);
                self.read(pc, target);
            }
            MicroOp::ReadPc => self.read(pc, Target::Discard),
            MicroOp::ReadPcHolding => self.issue(Transaction {
                samples_interrupts: false,
                ..Transaction::read(pc, Target::Discard)
            }),
            MicroOp::ReadAddress(target) => self.read(self.latches.address, target),
            MicroOp::WriteAddress => self.write(self.latches.address, self.latches.operand),
            MicroOp::ReadPrevious => self.read(self.last_bus_address, Target::Discard),
            MicroOp::ReadPointer(target) => self.read(self.latches.pointer, target),
            MicroOp::ReadStack => self.read(self.regs.stack_addr(), Target::Discard),
            MicroOp::Push(source) => {
                let value = self.source(source);
                let address = self.regs.push();
                self.write(address, value);
            }
            MicroOp::PushDiscard => {
                let address = self.regs.push();
                self.read(address, Target::Discard);
            }
            MicroOp::Pull(target) => {
                let address = self.regs.pop();
                self.read(address, target);
            }
            MicroOp::ReadVectorLow => self.read(self.latches.vector, Target::PcLow),
            MicroOp::ReadVectorHigh => {
                self.read(self.latches.vector.wrapping_add(1), Target::PcHigh);
            }
            MicroOp::Idle => self.issue(Transaction {
                operation: BusOperation::None,
                ..Transaction::read(pc, Target::Discard)
            }),

            MicroOp::Decode => {
                self.last_operation_address = pc;
                self.regs.pc = pc.wrapping_add(1);
                self.cursor = Some(Cursor::start(ProgramId::Opcode(self.latches.opcode)));
            }
            MicroOp::Execute(operation) => self.execute(operation),
            MicroOp::Accumulator(operation) => {
                self.latches.operand = self.regs.a;
                self.execute(operation);
                self.regs.a = self.latches.operand;
            }
            MicroOp::IndexLow(index) => {
                let address = self.latches.address;
                let low = (address & 0x00FF) + u16::from(self.index(index));
                self.latches.base_high = (address >> 8) as u8;
                self.latches.page_crossed = low > 0xFF;
                self.latches.address = (address & 0xFF00) | (low & 0x00FF);
            }
            MicroOp::ZeroPageIndex(index) => {
                let low = (self.latches.address as u8).wrapping_add(self.index(index));
                self.latches.address = u16::from(low);
            }
            MicroOp::IndexPointer(wrap) => {
                self.latches.pointer = offset(self.latches.pointer, self.regs.x, wrap);
            }
            MicroOp::IncrementPointer(wrap) => {
                self.latches.pointer = offset(self.latches.pointer, 1, wrap);
            }
            MicroOp::FixIfCrossed => {
                if self.latches.page_crossed {
                    self.splice(ProgramId::PageFix);
                }
            }
            MicroOp::PageFix => self.splice(ProgramId::PageFix),
            MicroOp::FixHigh => {
                if self.latches.page_crossed {
                    self.latches.address = self.latches.address.wrapping_add(0x0100);
                }
            }
            MicroOp::Branch(condition) => {
                if programs::condition_holds(condition, &self.regs.flags, self.latches.bit_test) {
                    let target = pc.wrapping_add(self.latches.operand as i8 as u16);
                    self.latches.address = target;
                    if target & 0xFF00 == pc & 0xFF00 {
                        self.splice(ProgramId::BranchTaken);
                    } else {
                        self.splice(ProgramId::BranchCrossed);
                    }
                }
            }
            MicroOp::BranchLow => {
                self.regs.pc = (pc & 0xFF00) | (self.latches.address & 0x00FF);
            }
            MicroOp::BranchJump => self.regs.pc = self.latches.address,
            MicroOp::PickVector(vector) => {
                // An NMI that arrives before the vector is chosen takes over
                // an IRQ or BRK already in progress.
                let vector = if vector == Vector::Irq
                    && self.interrupts.requests.contains(Requests::NMI)
                {
                    self.interrupts.acknowledge_nmi();
                    log::trace!("NMI hijacked vector fetch at ${pc:04X}");
                    Vector::Nmi
                } else {
                    vector
                };
                self.latches.vector = vector.address();
            }
            MicroOp::EnterInterrupt => {
                self.regs.flags.set_interrupt_disable(true);
                if self.config.personality.is_cmos() {
                    self.regs.flags.set_decimal(false);
                }
            }
        }
    }

    fn arithmetic(&self) -> Arithmetic {
        let capabilities = self.config.personality.capabilities();
        if !self.regs.flags.decimal() || !capabilities.decimal_mode {
            Arithmetic::Binary
        } else if capabilities.cmos {
            Arithmetic::CmosDecimal
        } else {
            Arithmetic::NmosDecimal
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    fn execute(&mut self, operation: Operation) {
        let val = self.latches.operand;
        let arithmetic = self.arithmetic();
        let regs = &mut self.regs;

        match operation {
            Operation::Lda => {
                regs.a = val;
                regs.flags.set_nz(val);
            }
            Operation::Ldx => {
                regs.x = val;
                regs.flags.set_nz(val);
            }
            Operation::Ldy => {
                regs.y = val;
                regs.flags.set_nz(val);
            }
            Operation::Sta => self.latches.operand = regs.a,
            Operation::Stx => self.latches.operand = regs.x,
            Operation::Sty => self.latches.operand = regs.y,
            Operation::Stz => self.latches.operand = 0,
            Operation::Sax => self.latches.operand = regs.a & regs.x,

            Operation::Ora => {
                regs.a |= val;
                regs.flags.set_nz(regs.a);
            }
            Operation::And => {
                regs.a &= val;
                regs.flags.set_nz(regs.a);
            }
            Operation::Eor => {
                regs.a ^= val;
                regs.flags.set_nz(regs.a);
            }
            Operation::Adc => {
                regs.adc(val, arithmetic);
                self.decimal_fixup(arithmetic);
            }
            Operation::Sbc => {
                regs.sbc(val, arithmetic);
                self.decimal_fixup(arithmetic);
            }
            Operation::Cmp => {
                let a = regs.a;
                regs.compare(a, val);
            }
            Operation::Cpx => {
                let x = regs.x;
                regs.compare(x, val);
            }
            Operation::Cpy => {
                let y = regs.y;
                regs.compare(y, val);
            }
            Operation::Bit => regs.bit(val),
            // Immediate BIT has no memory operand to take N and V from
            Operation::BitImmediate => regs.flags.zero_result = regs.a & val,

            Operation::Asl => self.latches.operand = regs.asl(val),
            Operation::Lsr => self.latches.operand = regs.lsr(val),
            Operation::Rol => self.latches.operand = regs.rol(val),
            Operation::Ror => self.latches.operand = regs.ror(val),
            Operation::Inc => {
                let result = val.wrapping_add(1);
                regs.flags.set_nz(result);
                self.latches.operand = result;
            }
            Operation::Dec => {
                let result = val.wrapping_sub(1);
                regs.flags.set_nz(result);
                self.latches.operand = result;
            }
            Operation::Tsb => {
                regs.flags.zero_result = regs.a & val;
                self.latches.operand = val | regs.a;
            }
            Operation::Trb => {
                regs.flags.zero_result = regs.a & val;
                self.latches.operand = val & !regs.a;
            }
            Operation::Rmb(bit) => self.latches.operand = val & !(1 << bit),
            Operation::Smb(bit) => self.latches.operand = val | (1 << bit),

            Operation::Tax => {
                regs.x = regs.a;
                regs.flags.set_nz(regs.x);
            }
            Operation::Tay => {
                regs.y = regs.a;
                regs.flags.set_nz(regs.y);
            }
            Operation::Txa => {
                regs.a = regs.x;
                regs.flags.set_nz(regs.a);
            }
            Operation::Tya => {
                regs.a = regs.y;
                regs.flags.set_nz(regs.a);
            }
            Operation::Tsx => {
                regs.x = regs.s;
                regs.flags.set_nz(regs.x);
            }
            Operation::Txs => regs.s = regs.x,
            Operation::Inx => {
                regs.x = regs.x.wrapping_add(1);
                regs.flags.set_nz(regs.x);
            }
            Operation::Iny => {
                regs.y = regs.y.wrapping_add(1);
                regs.flags.set_nz(regs.y);
            }
            Operation::Dex => {
                regs.x = regs.x.wrapping_sub(1);
                regs.flags.set_nz(regs.x);
            }
            Operation::Dey => {
                regs.y = regs.y.wrapping_sub(1);
                regs.flags.set_nz(regs.y);
            }
            Operation::Clc => regs.flags.set_carry(false),
            Operation::Sec => regs.flags.set_carry(true),
            Operation::Cli => regs.flags.set_interrupt_disable(false),
            Operation::Sei => regs.flags.set_interrupt_disable(true),
            Operation::Cld => regs.flags.set_decimal(false),
            Operation::Sed => regs.flags.set_decimal(true),
            Operation::Clv => regs.flags.set_overflow(false),
            Operation::Nop => {}

            Operation::Jmp => regs.pc = self.latches.address,
            Operation::Wai => {
                log::debug!("WAI at ${:04X}", self.last_operation_address);
                self.state = RunState::Waiting;
            }
            Operation::Stp => {
                log::debug!("STP at ${:04X}", self.last_operation_address);
                self.state = RunState::Stopped;
            }
            Operation::Jam => {
                log::debug!(
                    "JAM ${:02X} at ${:04X}",
                    self.latches.opcode,
                    self.last_operation_address
                );
                self.state = RunState::Jammed;
            }

            // Undocumented combinations
            Operation::Slo => {
                let result = regs.asl(val);
                self.latches.operand = result;
                regs.a |= result;
                regs.flags.set_nz(regs.a);
            }
            Operation::Rla => {
                let result = regs.rol(val);
                self.latches.operand = result;
                regs.a &= result;
                regs.flags.set_nz(regs.a);
            }
            Operation::Sre => {
                let result = regs.lsr(val);
                self.latches.operand = result;
                regs.a ^= result;
                regs.flags.set_nz(regs.a);
            }
            Operation::Rra => {
                let result = regs.ror(val);
                self.latches.operand = result;
                regs.adc(result, arithmetic);
            }
            Operation::Lax => {
                regs.a = val;
                regs.x = val;
                regs.flags.set_nz(val);
            }
            Operation::Dcp => {
                let result = val.wrapping_sub(1);
                self.latches.operand = result;
                let a = regs.a;
                regs.compare(a, result);
            }
            Operation::Isc => {
                let result = val.wrapping_add(1);
                self.latches.operand = result;
                regs.sbc(result, arithmetic);
            }
            Operation::Anc => {
                regs.a &= val;
                regs.flags.set_nz(regs.a);
                regs.flags.set_carry(regs.a & 0x80 != 0);
            }
            Operation::Alr => {
                let and = regs.a & val;
                regs.a = regs.lsr(and);
            }
            Operation::Arr => regs.arr(val, arithmetic),
            Operation::Ane => {
                regs.a = (regs.a | 0xEE) & regs.x & val;
                regs.flags.set_nz(regs.a);
            }
            Operation::Lxa => {
                regs.a = (regs.a | 0xEE) & val;
                regs.x = regs.a;
                regs.flags.set_nz(regs.a);
            }
            Operation::Sbx => regs.sbx(val),
            Operation::Las => {
                let result = val & regs.s;
                regs.a = result;
                regs.x = result;
                regs.s = result;
                regs.flags.set_nz(result);
            }
            Operation::Sha | Operation::Shx | Operation::Shy | Operation::Shs => {
                self.unstable_store(operation);
            }
        }
    }

    /// The 65C02 spends an extra cycle producing valid decimal flags.
    fn decimal_fixup(&mut self, arithmetic: Arithmetic) {
        if arithmetic == Arithmetic::CmosDecimal {
            self.splice(ProgramId::DecimalFixup);
        }
    }

    /// SHA/SHX/SHY/SHS: store `source & (high + 1)`. If indexing crossed a
    /// page, that value also replaces the address high byte.
    fn unstable_store(&mut self, operation: Operation) {
        let regs = &mut self.regs;
        let source = match operation {
            Operation::Sha => regs.a & regs.x,
            Operation::Shx => regs.x,
            Operation::Shy => regs.y,
            _ => {
                regs.s = regs.a & regs.x;
                regs.s
            }
        };
        let value = source & self.latches.base_high.wrapping_add(1);
        self.latches.operand = value;
        if self.latches.page_crossed {
            self.latches.address = (u16::from(value) << 8) | (self.latches.address & 0x00FF);
        }
    }
}

/// Cycle counts past `i64::MAX` clamp instead of wrapping negative.
fn signed(cycles: Cycles) -> i64 {
    i64::try_from(cycles.get()).unwrap_or(i64::MAX)
}

fn offset(pointer: u16, amount: u8, wrap: Wrap) -> u16 {
    match wrap {
        Wrap::Page => (pointer & 0xFF00) | u16::from((pointer as u8).wrapping_add(amount)),
        Wrap::Carry => pointer.wrapping_add(u16::from(amount)),
    }
}

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn run_for<B: Bus>(&mut self, bus: &mut B, budget: Cycles) -> Cycles {
        self.advance(bus, budget).consumed
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        matches!(self.state, RunState::Jammed | RunState::Stopped)
    }

    fn set_reset_line(&mut self, active: bool) {
        self.interrupts.set_reset_line(active);
    }

    fn set_irq_line(&mut self, active: bool) {
        self.interrupts.set_irq_line(active);
    }

    fn set_nmi_line(&mut self, active: bool) {
        self.interrupts.set_nmi_line(active);
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        let flags = &self.regs.flags;
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(flags.packed().into()),
            "flags.c" | "c" => Some(flags.is_set(C).into()),
            "flags.z" | "z" => Some(flags.is_set(Z).into()),
            "flags.i" | "i" => Some(flags.is_set(I).into()),
            "flags.d" | "d" => Some(flags.is_set(D).into()),
            "flags.v" | "v" => Some(flags.is_set(V).into()),
            "flags.n" | "n" => Some(flags.is_set(N).into()),
            "last_operation_address" => Some(self.last_operation_address.into()),
            "cycle" => Some(Value::U64(self.total_cycles.get())),
            "jammed" => Some(self.is_jammed().into()),
            "halted" => Some(self.is_halted().into()),
            "state" => Some(self.state.name().into()),
            "personality" => Some(self.personality().name().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.v",
            "flags.n",
            "last_operation_address",
            "cycle",
            "jammed",
            "halted",
            "state",
            "personality",
        ]
    }
}
