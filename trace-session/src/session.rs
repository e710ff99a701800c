//! Tracing session
//!
//! A [`Session`] holds the metadata written at the head of the trace and
//! the [`FrameWriter`] that receives every subsequent event. Dropping an
//! unfinished session flushes the open instruction frame and closes the
//! trace, reporting but not raising any failure.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::host::{HostEnv, SystemHost};
use crate::metadata::MetadataBuilder;
use frame_tracer::{
    Event, FrameWriter, Handled, JsonLinesSink, SessionMetadata, TraceSink, WriterStats,
};

pub struct Session<S: TraceSink = JsonLinesSink> {
    metadata: SessionMetadata,
    writer: FrameWriter<S>,
}

impl Session<JsonLinesSink> {
    /// Start a session against the running system
    pub fn start(
        config: &SessionConfig,
        argv: &[String],
        envp: &[String],
    ) -> Result<Self, SessionError> {
        Self::start_with_host(&SystemHost, config, argv, envp)
    }

    /// Start a session, querying `host` for target and environment details
    pub fn start_with_host(
        host: &impl HostEnv,
        config: &SessionConfig,
        argv: &[String],
        envp: &[String],
    ) -> Result<Self, SessionError> {
        let metadata = MetadataBuilder::new(host, config.tracer.clone()).build(argv, envp)?;
        let sink = JsonLinesSink::open(&config.output, &metadata, config.machine)?;
        Ok(Self::with_sink(metadata, sink))
    }
}

impl<S: TraceSink> Session<S> {
    /// Wrap an already opened sink
    pub fn with_sink(metadata: SessionMetadata, sink: S) -> Self {
        Self {
            metadata,
            writer: FrameWriter::new(sink),
        }
    }

    pub fn handle(&mut self, event: Event) -> Result<Handled, SessionError> {
        Ok(self.writer.handle(event)?)
    }

    /// Flush the open frame and close the trace
    pub fn finish(&mut self) -> Result<WriterStats, SessionError> {
        Ok(self.writer.finish()?)
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn writer(&self) -> &FrameWriter<S> {
        &self.writer
    }
}
