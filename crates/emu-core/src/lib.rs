//! Core traits and types for cycle-accurate emulation.
//!
//! Components talk to the outside world one bus transaction at a time.
//! Every transaction reports its duration in [`Cycles`], and that is the
//! only clock a component sees.

mod bus;
mod cpu;
mod cycles;
mod observable;

pub use bus::{Access, Bus, BusOperation, SimpleBus};
pub use cpu::Cpu;
pub use cycles::Cycles;
pub use observable::{Observable, Value};
