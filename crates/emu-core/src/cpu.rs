//! CPU core trait.

use crate::{Bus, Cycles};

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus, one
/// transaction per bus cycle. A host interleaves a CPU with other
/// components by handing it small cycle budgets; the CPU must be able to
/// stop between any two bus cycles and pick up exactly where it left off.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Run until at least `budget` cycles have elapsed on the bus.
    ///
    /// The bus is passed in, not owned, so it can be shared with other
    /// components (e.g., video chip). Returns the cycles actually consumed,
    /// which can exceed the budget if the bus stretched the final access.
    fn run_for<B: Bus>(&mut self, bus: &mut B, budget: Cycles) -> Cycles;

    /// Returns the current program counter.
    ///
    /// Returns `u32` to support all CPU address widths. Narrower CPUs
    /// zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU can make no further progress without an
    /// external line change.
    fn is_halted(&self) -> bool;

    /// Drive the reset input. Active is asserted, whatever the pin polarity.
    fn set_reset_line(&mut self, active: bool);

    /// Drive the maskable interrupt input (level-sensitive).
    fn set_irq_line(&mut self, active: bool);

    /// Drive the non-maskable interrupt input (edge-sensitive).
    fn set_nmi_line(&mut self, active: bool);
}
