//! Processor personalities and core configuration.
//!
//! One core implements the whole family; the personality gates which
//! opcode table is built and how decimal mode and dummy cycles behave.

/// Selected member of the 6502 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Personality {
    /// Original NMOS 6502, including the undocumented opcodes.
    #[default]
    Nmos6502,
    /// NES/Famicom CPU: NMOS core with decimal mode disconnected.
    Ricoh2A03,
    /// 65C02 without the Rockwell bit instructions.
    Synertek65C02,
    /// Rockwell R65C02: adds RMB/SMB/BBR/BBS.
    Rockwell65C02,
    /// WDC W65C02S: Rockwell set plus WAI and STP.
    Wdc65C02,
}

/// Capability flags for a specific personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// ADC/SBC honour the D flag.
    pub decimal_mode: bool,
    /// CMOS instruction set, timing and bug fixes.
    pub cmos: bool,
    /// RMB/SMB/BBR/BBS are available.
    pub bit_operations: bool,
    /// WAI and STP are available.
    pub wait_and_stop: bool,
}

impl Personality {
    pub const ALL: [Self; 5] = [
        Self::Nmos6502,
        Self::Ricoh2A03,
        Self::Synertek65C02,
        Self::Rockwell65C02,
        Self::Wdc65C02,
    ];

    /// Static capability set for this personality.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Nmos6502 => Capabilities {
                decimal_mode: true,
                cmos: false,
                bit_operations: false,
                wait_and_stop: false,
            },
            Self::Ricoh2A03 => Capabilities {
                decimal_mode: false,
                cmos: false,
                bit_operations: false,
                wait_and_stop: false,
            },
            Self::Synertek65C02 => Capabilities {
                decimal_mode: true,
                cmos: true,
                bit_operations: false,
                wait_and_stop: false,
            },
            Self::Rockwell65C02 => Capabilities {
                decimal_mode: true,
                cmos: true,
                bit_operations: true,
                wait_and_stop: false,
            },
            Self::Wdc65C02 => Capabilities {
                decimal_mode: true,
                cmos: true,
                bit_operations: true,
                wait_and_stop: true,
            },
        }
    }

    #[must_use]
    pub const fn is_cmos(self) -> bool {
        self.capabilities().cmos
    }

    /// Short name for logs and the observable surface.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nmos6502 => "6502",
            Self::Ricoh2A03 => "2A03",
            Self::Synertek65C02 => "65C02",
            Self::Rockwell65C02 => "R65C02",
            Self::Wdc65C02 => "W65C02S",
        }
    }
}

/// Core construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub personality: Personality,
    /// Model the RDY input. Cores built without it reject
    /// `set_ready_line`.
    pub ready_line: bool,
}

impl Config {
    #[must_use]
    pub const fn new(personality: Personality) -> Self {
        Self {
            personality,
            ready_line: false,
        }
    }

    #[must_use]
    pub const fn with_ready_line(mut self) -> Self {
        self.ready_line = true;
        self
    }
}
