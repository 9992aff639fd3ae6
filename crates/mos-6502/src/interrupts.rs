//! Interrupt and reset request tracking.
//!
//! Lines are driven by the host at any time. Requests derived from them
//! are sampled once per bus cycle, just before the cycle is performed; the
//! arbiter only ever looks at that snapshot, so an instruction's fate is
//! sealed by the lines as they stood before its final cycle.

use std::fmt;

/// Set of pending interrupt requests.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requests(u8);

impl Requests {
    pub const NONE: Self = Self(0);
    pub const POWER_ON: Self = Self(0x01);
    pub const RESET: Self = Self(0x02);
    pub const NMI: Self = Self(0x04);
    pub const IRQ: Self = Self(0x08);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl fmt::Debug for Requests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::POWER_ON, "POWER_ON"),
            (Self::RESET, "RESET"),
            (Self::NMI, "NMI"),
            (Self::IRQ, "IRQ"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in names {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// Input line levels. `true` is asserted regardless of pin polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lines {
    pub reset: bool,
    pub irq: bool,
    pub nmi: bool,
    pub ready: bool,
    pub overflow: bool,
}

/// Latched requests, line levels and the per-cycle sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interrupts {
    /// Edge- and power-on-latched requests. IRQ is never latched here; it
    /// follows the line.
    pub requests: Requests,
    /// Snapshot taken before the most recent bus cycle.
    pub sampled: Requests,
    pub lines: Lines,
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: Requests::POWER_ON,
            sampled: Requests::POWER_ON,
            lines: Lines {
                reset: false,
                irq: false,
                nmi: false,
                ready: false,
                overflow: false,
            },
        }
    }

    /// Requests as they stand right now. IRQ counts only while I is clear.
    #[must_use]
    pub const fn current(&self, interrupt_disable: bool) -> Requests {
        if self.lines.irq && !interrupt_disable {
            self.requests.union(Requests::IRQ)
        } else {
            self.requests
        }
    }

    pub fn sample(&mut self, interrupt_disable: bool) {
        self.sampled = self.current(interrupt_disable);
    }

    pub fn set_reset_line(&mut self, active: bool) {
        if active {
            self.requests.insert(Requests::RESET);
        }
        self.lines.reset = active;
    }

    pub fn set_irq_line(&mut self, active: bool) {
        self.lines.irq = active;
    }

    /// NMI latches on the rising edge only.
    pub fn set_nmi_line(&mut self, active: bool) {
        if active && !self.lines.nmi {
            self.requests.insert(Requests::NMI);
        }
        self.lines.nmi = active;
    }

    /// Returns true on a rising edge.
    pub fn set_overflow_line(&mut self, active: bool) -> bool {
        let edge = active && !self.lines.overflow;
        self.lines.overflow = active;
        edge
    }

    /// The reset program has been selected. A reset line that is still held
    /// keeps requesting.
    pub fn acknowledge_reset(&mut self) {
        self.requests.remove(Requests::POWER_ON.union(Requests::RESET));
        if self.lines.reset {
            self.requests.insert(Requests::RESET);
        }
    }

    pub fn acknowledge_nmi(&mut self) {
        self.requests.remove(Requests::NMI);
    }
}
