//! Memory and I/O bus interface.

use crate::Cycles;

/// The kind of access a component is making on a given bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusOperation {
    /// Ordinary data read.
    Read,
    /// Read of an instruction's first byte (SYNC asserted on a 6502).
    ReadOpcode,
    /// Write of `*value`.
    Write,
    /// A read held off by the ready line. The value is ignored; the bus
    /// decides how long the hold lasts by the cycles it returns.
    Ready,
    /// An idle cycle with nothing on the bus (wait/stop states).
    None,
}

impl BusOperation {
    /// True for operations that expect the bus to fill in `value`.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadOpcode)
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// Memory and I/O bus interface.
///
/// Components perform exactly one transaction per bus cycle through this
/// trait. The bus handles address decoding and routing to the appropriate
/// device, and reports how long the access took.
pub trait Bus {
    /// Perform one transaction.
    ///
    /// For reads, the bus stores the byte in `value`. For writes, it
    /// consumes `*value`. Returns the number of cycles elapsed, normally
    /// [`Cycles::ONE`].
    fn perform(&mut self, operation: BusOperation, address: u16, value: &mut u8) -> Cycles;
}

/// One transaction as seen by [`SimpleBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Access {
    pub operation: BusOperation,
    pub address: u16,
    pub value: u8,
}

/// Flat 64 KiB RAM with no I/O.
///
/// Every transaction takes one cycle. Optionally records the transactions it
/// sees, which test harnesses use to check bus-level timing.
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
    trace: Option<Vec<Access>>,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            trace: None,
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            self.poke(address.wrapping_add(offset as u16), byte);
        }
    }

    /// Read memory without recording an access.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }

    /// Write memory without recording an access.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
    }

    /// Start (or restart) recording transactions.
    pub fn record(&mut self) {
        self.trace = Some(Vec::new());
    }

    /// Take everything recorded so far. Recording continues if it was on.
    pub fn take_trace(&mut self) -> Vec<Access> {
        match self.trace.as_mut() {
            Some(trace) => std::mem::take(trace),
            None => Vec::new(),
        }
    }

    #[must_use]
    pub fn trace(&self) -> &[Access] {
        self.trace.as_deref().unwrap_or(&[])
    }
}

impl Bus for SimpleBus {
    fn perform(&mut self, operation: BusOperation, address: u16, value: &mut u8) -> Cycles {
        match operation {
            BusOperation::Read | BusOperation::ReadOpcode => *value = self.peek(address),
            BusOperation::Write => self.poke(address, *value),
            BusOperation::Ready | BusOperation::None => {}
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.push(Access {
                operation,
                address,
                value: *value,
            });
        }
        Cycles::ONE
    }
}
