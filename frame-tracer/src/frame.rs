//! Trace frame data structures

use crate::event::hex_bytes;
use crate::operand::OperandInfo;
use serde::{Deserialize, Serialize};

/// One finalized unit of trace output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum Frame {
    Std(InstructionFrame),
    ModLoad(ModuleLoadFrame),
    Syscall(SyscallFrame),
}

impl Frame {
    /// Short frame kind name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Std(_) => "std",
            Frame::ModLoad(_) => "modload",
            Frame::Syscall(_) => "syscall",
        }
    }

    pub fn as_instruction(&self) -> Option<&InstructionFrame> {
        match self {
            Frame::Std(frame) => Some(frame),
            _ => None,
        }
    }
}

/// One executed instruction with its operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFrame {
    /// Instruction address
    pub address: u64,
    pub thread_id: u32,
    /// Raw instruction bytes
    #[serde(with = "hex_bytes")]
    pub raw_bytes: Vec<u8>,
    /// Operands read by the instruction, in arrival order
    pub pre_operands: Vec<OperandInfo>,
    /// Operands written by the instruction, in arrival order
    pub post_operands: Vec<OperandInfo>,
}

impl InstructionFrame {
    /// Create a frame with empty operand lists
    pub fn new(address: u64, thread_id: u32, raw_bytes: Vec<u8>) -> Self {
        Self {
            address,
            thread_id,
            raw_bytes,
            pre_operands: Vec::new(),
            post_operands: Vec::new(),
        }
    }

    /// Total number of operands
    pub fn operand_count(&self) -> usize {
        self.pre_operands.len() + self.post_operands.len()
    }
}

/// A module mapped into the target's address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLoadFrame {
    pub module_name: String,
    pub low_address: u64,
    pub high_address: u64,
}

/// A system call with its raw argument words in call-site order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyscallFrame {
    pub address: u64,
    pub thread_id: u32,
    pub number: u64,
    pub arguments: Vec<u64>,
}
