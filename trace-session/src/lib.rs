//! Trace Session - Session start-up and trace file output
//!
//! This crate builds the one-time session metadata (tracer and target
//! identity, content hash, file stats, user, host, time), opens a trace
//! file with it, and feeds events through a [`frame_tracer::FrameWriter`].
//!
//! The process argv is split at the first `--`: everything before belongs
//! to the tracer, everything after is the target command line.

pub mod args;
pub mod config;
pub mod digest;
pub mod error;
pub mod host;
pub mod metadata;
pub mod resolve;
pub mod session;

pub use args::{split_args, ArgSplit};
pub use config::{SessionConfig, TracerIdentity};
pub use error::SessionError;
pub use host::{HostEnv, SystemHost};
pub use metadata::MetadataBuilder;
pub use resolve::resolve_target;
pub use session::Session;

use frame_tracer::{read_event_log, WriterStats};
use std::path::Path;

/// Result type for session operations
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Replay a recorded JSON-lines event log into a new trace file
///
/// Events are processed in log order; the first usage error stops the
/// replay and the partial trace is closed.
pub fn replay_event_log(
    config: &SessionConfig,
    argv: &[String],
    envp: &[String],
    event_log: &Path,
) -> Result<WriterStats> {
    replay_event_log_with_host(&SystemHost, config, argv, envp, event_log)
}

/// Replay an event log, querying `host` for target and environment details
pub fn replay_event_log_with_host(
    host: &impl HostEnv,
    config: &SessionConfig,
    argv: &[String],
    envp: &[String],
    event_log: &Path,
) -> Result<WriterStats> {
    let events = read_event_log(event_log).map_err(SessionError::EventLog)?;
    tracing::info!("Replaying {} events from {}", events.len(), event_log.display());

    let mut session = Session::start_with_host(host, config, argv, envp)?;
    for event in events {
        session.handle(event)?;
    }
    session.finish()
}
