//! Instruction frame accumulator
//!
//! Holds at most one open [`InstructionFrame`]. Operand accesses are
//! appended to its pre- or post-operand list until the next instruction
//! starts or the session ends, at which point the frame is handed back to
//! the caller for writing.

use crate::error::FrameError;
use crate::flags::{decompose, Flag};
use crate::frame::InstructionFrame;
use crate::operand::{encode_memory, encode_register, OperandInfo, Usage};

#[derive(Debug, Default)]
pub struct FrameAccumulator {
    open: Option<InstructionFrame>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an instruction frame is under construction
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The frame under construction, if any
    pub fn current(&self) -> Option<&InstructionFrame> {
        self.open.as_ref()
    }

    /// Open a frame for a new instruction
    ///
    /// Returns the previously open frame, now finished.
    pub fn start(
        &mut self,
        address: u64,
        thread_id: u32,
        raw_bytes: Vec<u8>,
    ) -> Option<InstructionFrame> {
        self.open.replace(InstructionFrame::new(address, thread_id, raw_bytes))
    }

    /// Close the open frame, if any
    pub fn finish(&mut self) -> Option<InstructionFrame> {
        self.open.take()
    }

    pub fn add_register(
        &mut self,
        event: &'static str,
        usage: Usage,
        name: &str,
        value: &[u8],
        width: u32,
    ) -> Result<(), FrameError> {
        let operand = encode_register(usage, name, value, width);
        self.push(event, usage, operand)
    }

    pub fn add_memory(
        &mut self,
        event: &'static str,
        usage: Usage,
        address: u64,
        value: &[u8],
    ) -> Result<(), FrameError> {
        let operand = encode_memory(usage, address, value);
        self.push(event, usage, operand)
    }

    /// Add one register operand per flag enabled for `usage`
    ///
    /// The extracted value is always one byte; the operand bit length is
    /// the flag's declared width.
    pub fn add_flags(
        &mut self,
        event: &'static str,
        usage: Usage,
        flags: &[Flag],
        bytes: &[u8],
    ) -> Result<(), FrameError> {
        let frame = self.open.as_mut().ok_or(FrameError::Usage { event })?;
        let list = operand_list(frame, usage);
        for flag in decompose(flags, bytes, usage) {
            list.push(encode_register(usage, &flag.name, &[flag.value], flag.width));
        }
        Ok(())
    }

    fn push(
        &mut self,
        event: &'static str,
        usage: Usage,
        operand: OperandInfo,
    ) -> Result<(), FrameError> {
        let frame = self.open.as_mut().ok_or(FrameError::Usage { event })?;
        operand_list(frame, usage).push(operand);
        Ok(())
    }
}

/// Reads go to the pre-state list, writes to the post-state list
fn operand_list(frame: &mut InstructionFrame, usage: Usage) -> &mut Vec<OperandInfo> {
    match usage {
        Usage::Read => &mut frame.pre_operands,
        Usage::Write => &mut frame.post_operands,
    }
}
