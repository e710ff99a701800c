//! Operand encoding
//!
//! Turns a raw register or memory access into an [`OperandInfo`] record.
//! Encoding is pure and never fails.

use crate::event::hex_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an operand access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usage {
    Read,
    Write,
}

/// Usage bits recorded with every operand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandUsage {
    pub read: bool,
    pub written: bool,
    /// Never set: addressing roles are not distinguished
    pub index: bool,
    /// Never set: addressing roles are not distinguished
    pub base: bool,
}

impl From<Usage> for OperandUsage {
    fn from(usage: Usage) -> Self {
        Self {
            read: usage == Usage::Read,
            written: usage == Usage::Write,
            index: false,
            base: false,
        }
    }
}

/// Taint information attached to an operand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taint {
    #[default]
    NoTaint,
}

/// Where an operand lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandLocation {
    Memory { address: u64 },
    Register { name: String },
}

/// One operand of an instruction frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandInfo {
    pub location: OperandLocation,
    pub bit_length: u32,
    pub usage: OperandUsage,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    pub taint: Taint,
}

impl OperandInfo {
    pub fn is_read(&self) -> bool {
        self.usage.read
    }

    pub fn is_written(&self) -> bool {
        self.usage.written
    }
}

impl fmt::Display for OperandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.usage.read { "R" } else { "W" };
        match &self.location {
            OperandLocation::Memory { address } => write!(f, "{} mem[{:#x}]", dir, address)?,
            OperandLocation::Register { name } => write!(f, "{} {}", dir, name)?,
        }
        write!(f, ":{} = {}", self.bit_length, hex::encode(&self.value))
    }
}

/// Bit length of an operand: the declared width wins when nonzero
fn bit_length(value: &[u8], declared_width: u32) -> u32 {
    if declared_width != 0 {
        declared_width
    } else {
        (value.len() as u32).saturating_mul(8)
    }
}

/// Encode an operand at a given location
pub fn encode_operand(
    location: OperandLocation,
    usage: Usage,
    value: &[u8],
    declared_width: u32,
) -> OperandInfo {
    OperandInfo {
        location,
        bit_length: bit_length(value, declared_width),
        usage: usage.into(),
        value: value.to_vec(),
        taint: Taint::NoTaint,
    }
}

/// Encode a memory operand; its width always derives from the value length
pub fn encode_memory(usage: Usage, address: u64, value: &[u8]) -> OperandInfo {
    encode_operand(OperandLocation::Memory { address }, usage, value, 0)
}

/// Encode a register operand
pub fn encode_register(usage: Usage, name: &str, value: &[u8], declared_width: u32) -> OperandInfo {
    encode_operand(
        OperandLocation::Register { name: name.to_string() },
        usage,
        value,
        declared_width,
    )
}
