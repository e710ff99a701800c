//! Session start-up errors

use frame_tracer::{FrameError, SinkError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a session before or while frames are written
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No target program given on the command line")]
    MissingTarget,

    #[error("{} not found", .path.display())]
    TargetNotFound { path: PathBuf },

    #[error("Failed to hash {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to obtain file stats for {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Failed to get host name: {0}")]
    Hostname(#[source] std::io::Error),

    #[error("Failed to get login name: {0}")]
    LoginName(#[source] std::io::Error),

    #[error("System clock is before the Unix epoch")]
    Clock,

    #[error("Failed to read event log: {0}")]
    EventLog(#[source] SinkError),

    #[error("Failed to open trace: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
