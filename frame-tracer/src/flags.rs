//! Condition flag tables and flag decomposition
//!
//! A flags-register access is recorded as one operand per individual flag.
//! The flag table comes with the event and tells, for the current
//! instruction, which flags are read and which are written.

use crate::operand::Usage;
use serde::{Deserialize, Serialize};

/// Read/write effect mask of a flag for one instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagEffect {
    pub read: bool,
    pub write: bool,
}

impl FlagEffect {
    pub const NONE: Self = Self { read: false, write: false };
    pub const READ: Self = Self { read: true, write: false };
    pub const WRITE: Self = Self { read: false, write: true };
    pub const READ_WRITE: Self = Self { read: true, write: true };

    /// Whether this mask enables the given direction
    pub fn allows(self, usage: Usage) -> bool {
        match usage {
            Usage::Read => self.read,
            Usage::Write => self.write,
        }
    }

    /// Whether the flag is touched at all
    pub fn is_active(self) -> bool {
        self.read || self.write
    }
}

/// One component of a composite flags register
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    /// Width in bits, used as the operand bit length
    pub width: u32,
    /// Bit position of the least significant bit in the register
    pub shift: u32,
    pub effect: FlagEffect,
}

impl Flag {
    pub fn new(name: impl Into<String>, shift: u32, width: u32, effect: FlagEffect) -> Self {
        Self { name: name.into(), width, shift, effect }
    }

    /// Extract this flag's value from little-endian register bytes
    ///
    /// Bits beyond the end of `bytes` read as zero. The result is wrapped
    /// into a single byte regardless of `width`.
    pub fn value(&self, bytes: &[u8]) -> u8 {
        let mut out = 0u8;
        for i in 0..self.width.min(8) {
            let Some(bit) = self.shift.checked_add(i) else {
                break;
            };
            let byte = bytes.get((bit / 8) as usize).copied().unwrap_or(0);
            out |= ((byte >> (bit % 8)) & 1) << i;
        }
        out
    }
}

/// A single flag operand extracted from a flags access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValue {
    pub name: String,
    pub value: u8,
    pub width: u32,
}

/// Split a flags-register access into per-flag values
///
/// Only flags whose effect allows `direction` are emitted, in table order.
pub fn decompose(flags: &[Flag], bytes: &[u8], direction: Usage) -> Vec<FlagValue> {
    flags
        .iter()
        .filter(|flag| flag.effect.allows(direction))
        .map(|flag| FlagValue {
            name: flag.name.clone(),
            value: flag.value(bytes),
            width: flag.width,
        })
        .collect()
}

/// x86 EFLAGS layout
pub mod x86 {
    use super::{Flag, FlagEffect};

    /// (name, bit position, width)
    const EFLAGS: &[(&str, u32, u32)] = &[
        ("CF", 0, 1),
        ("PF", 2, 1),
        ("AF", 4, 1),
        ("ZF", 6, 1),
        ("SF", 7, 1),
        ("TF", 8, 1),
        ("IF", 9, 1),
        ("DF", 10, 1),
        ("OF", 11, 1),
        ("IOPL", 12, 2),
        ("NT", 14, 1),
        ("RF", 16, 1),
        ("VM", 17, 1),
        ("AC", 18, 1),
        ("VIF", 19, 1),
        ("VIP", 20, 1),
        ("ID", 21, 1),
    ];

    /// Full EFLAGS table with the same effect on every flag
    pub fn eflags(effect: FlagEffect) -> Vec<Flag> {
        EFLAGS
            .iter()
            .map(|&(name, shift, width)| Flag::new(name, shift, width, effect))
            .collect()
    }

    /// EFLAGS table where only the named flags carry `effect`
    pub fn eflags_with(names: &[&str], effect: FlagEffect) -> Vec<Flag> {
        EFLAGS
            .iter()
            .map(|&(name, shift, width)| {
                let e = if names.contains(&name) { effect } else { FlagEffect::NONE };
                Flag::new(name, shift, width, e)
            })
            .collect()
    }
}
