//! Frame Tracer - Structured trace frames from instruction-level events
//!
//! This crate turns the stream of low-level events produced by an
//! instruction-level instrumentation layer into trace frames ready for
//! durable storage.
//!
//! # Overview
//!
//! Every event goes through a [`FrameWriter`]:
//!
//! * `OperationStart` opens a new instruction frame and finishes the
//!   previous one
//! * Register, memory and flags accesses are encoded as operands and added
//!   to the open frame: reads to the pre-state list, writes to the
//!   post-state list
//! * Module loads and system calls become frames of their own and are
//!   written immediately
//! * Unsupported events are logged and skipped
//!
//! Finished frames go to a [`TraceSink`] in event order.
//!
//! # Usage
//!
//! ```
//! use frame_tracer::{Event, FrameWriter, MemoryAccess, MemorySink};
//!
//! let mut writer = FrameWriter::new(MemorySink::new());
//! writer
//!     .handle(Event::OperationStart { address: 0x400000, thread_id: 1, bytes: vec![0x90] })
//!     .unwrap();
//! writer
//!     .handle(Event::MemoryRead(MemoryAccess { address: 0x1000, bytes: vec![0x01] }))
//!     .unwrap();
//! writer.finish().unwrap();
//!
//! assert_eq!(writer.sink().frames().len(), 1);
//! ```
//!
//! # Limitations
//!
//! * Operands never carry index/base addressing roles.
//! * Taint is not tracked; every operand is marked untainted.

pub mod accumulator;
pub mod error;
pub mod event;
pub mod flags;
pub mod frame;
pub mod machine;
pub mod meta;
pub mod operand;
pub mod sink;
pub mod writer;

pub use accumulator::FrameAccumulator;
pub use error::{FrameError, SinkError};
pub use event::{read_event_log, Event, FlagsAccess, MemoryAccess, RegisterAccess};
pub use flags::{Flag, FlagEffect};
pub use frame::{Frame, InstructionFrame, ModuleLoadFrame, SyscallFrame};
pub use machine::{Architecture, Machine, MachineConfig};
pub use meta::{FileStats, SessionMetadata, TargetInfo, TracerInfo};
pub use operand::{encode_operand, OperandInfo, OperandLocation, OperandUsage, Taint, Usage};
pub use sink::{read_trace, JsonLinesSink, MemorySink, TraceHeader, TraceSink};
pub use writer::{FrameWriter, Handled, WriterStats};

/// Result type for frame tracer operations
pub type Result<T, E = FrameError> = std::result::Result<T, E>;
