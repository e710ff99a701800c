//! Session configuration

use frame_tracer::MachineConfig;
use std::path::PathBuf;

/// Name and version recorded for the tracer itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerIdentity {
    pub name: String,
    pub version: String,
}

impl Default for TracerIdentity {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Configuration for one tracing session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Trace file to create
    pub output: PathBuf,
    pub machine: MachineConfig,
    pub tracer: TracerIdentity,
}

impl SessionConfig {
    pub fn new(output: impl Into<PathBuf>, machine: MachineConfig) -> Self {
        Self {
            output: output.into(),
            machine,
            tracer: TracerIdentity::default(),
        }
    }

    pub fn with_tracer(mut self, tracer: TracerIdentity) -> Self {
        self.tracer = tracer;
        self
    }
}
