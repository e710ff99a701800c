//! Error types for frame encoding and trace output

use thiserror::Error;

/// Failures of the trace store
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Trace sink is already closed")]
    Closed,

    #[error("Trace file has no header line")]
    MissingHeader,
}

/// Failures while turning events into frames
#[derive(Error, Debug)]
pub enum FrameError {
    /// An operand event arrived while no instruction frame was open
    #[error("{event} event with no open instruction frame")]
    Usage { event: &'static str },

    /// An event arrived after the writer was finished
    #[error("{event} event after the trace was finished")]
    Finished { event: &'static str },

    #[error("Failed to append frame: {0}")]
    Sink(#[source] SinkError),

    #[error("Failed to close trace: {0}")]
    Teardown(#[source] SinkError),
}
