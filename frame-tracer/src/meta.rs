//! Session metadata record written once at the head of a trace

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tracer that produced a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerInfo {
    pub name: String,
    pub version: String,
    /// Tracer-level arguments (everything before `--`)
    pub args: Vec<String>,
    /// Environment snapshot as `KEY=VALUE` entries
    pub envp: Vec<String>,
}

/// The traced program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Resolved absolute path of the executable
    pub path: String,
    /// Target argv; position 0 is the path as given on the command line
    pub args: Vec<String>,
    pub envp: Vec<String>,
    /// Content digest of the executable
    #[serde(with = "crate::event::hex_bytes")]
    pub digest: Vec<u8>,
}

/// Size and timestamps of the target executable, in seconds since the epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

/// Metadata for one tracing session
///
/// Built once before any frame is written and never amended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub tracer: TracerInfo,
    pub target: TargetInfo,
    pub fstats: FileStats,
    pub user: String,
    pub host: String,
    /// Session start, seconds since the epoch
    pub time: u64,
}

impl fmt::Display for SessionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} tracing {} (sha256 {}) as {}@{}",
            self.tracer.name,
            self.tracer.version,
            self.target.path,
            hex::encode(&self.target.digest),
            self.user,
            self.host
        )
    }
}
