//! Instrumentation events consumed by the frame writer

use crate::flags::Flag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One semantic event observed while the target executes
///
/// Events are produced by the instrumentation layer and consumed exactly
/// once by [`FrameWriter::handle`](crate::FrameWriter::handle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Start of a new instruction; closes the previous instruction frame
    OperationStart {
        address: u64,
        thread_id: u32,
        #[serde(with = "hex_bytes")]
        bytes: Vec<u8>,
    },
    RegisterRead(RegisterAccess),
    RegisterWrite(RegisterAccess),
    MemoryRead(MemoryAccess),
    MemoryWrite(MemoryAccess),
    FlagsRead(FlagsAccess),
    FlagsWrite(FlagsAccess),
    ModuleLoad {
        name: String,
        low: u64,
        high: u64,
    },
    SystemCall {
        address: u64,
        thread_id: u32,
        number: u64,
        args: Vec<u64>,
    },
    /// Instrumentation category the frames format does not record
    Unsupported { description: String },
}

/// Register read or write: register name, declared width and value bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAccess {
    pub name: String,
    /// Declared width in bits; 0 means "derive from the value length"
    #[serde(default)]
    pub width: u32,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

/// Memory load or store at `address`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccess {
    pub address: u64,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

/// Access to a composite flags register
///
/// `flags` is the architecture flag table with the per-instruction effect
/// of every flag; `bytes` is the raw register content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsAccess {
    pub flags: Vec<Flag>,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

impl Event {
    /// Short name of the event variant, used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Event::OperationStart { .. } => "operation_start",
            Event::RegisterRead(_) => "register_read",
            Event::RegisterWrite(_) => "register_write",
            Event::MemoryRead(_) => "memory_read",
            Event::MemoryWrite(_) => "memory_write",
            Event::FlagsRead(_) => "flags_read",
            Event::FlagsWrite(_) => "flags_write",
            Event::ModuleLoad { .. } => "module_load",
            Event::SystemCall { .. } => "system_call",
            Event::Unsupported { .. } => "unsupported",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::OperationStart { address, thread_id, bytes } => {
                write!(f, "op {:#x} tid={} [{}]", address, thread_id, hex::encode(bytes))
            }
            Event::RegisterRead(r) | Event::RegisterWrite(r) => {
                write!(f, "{} {}={}", self.kind(), r.name, hex::encode(&r.bytes))
            }
            Event::MemoryRead(m) | Event::MemoryWrite(m) => {
                write!(f, "{} [{:#x}]={}", self.kind(), m.address, hex::encode(&m.bytes))
            }
            Event::FlagsRead(fl) | Event::FlagsWrite(fl) => {
                write!(f, "{} {}", self.kind(), hex::encode(&fl.bytes))
            }
            Event::ModuleLoad { name, low, high } => {
                write!(f, "module {} {:#x}-{:#x}", name, low, high)
            }
            Event::SystemCall { address, thread_id, number, args } => {
                write!(f, "syscall {} at {:#x} tid={} args={:x?}", number, address, thread_id, args)
            }
            Event::Unsupported { description } => write!(f, "unsupported ({})", description),
        }
    }
}

/// Read a JSON-lines event log, one [`Event`] per non-empty line
pub fn read_event_log(path: impl AsRef<Path>) -> Result<Vec<Event>, crate::SinkError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}

/// Serde adapter storing byte vectors as hex strings
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
