//! Trace sinks
//!
//! A sink is the ordered, append-only store that receives finished frames.
//! [`JsonLinesSink`] writes a header line followed by one line per frame;
//! [`MemorySink`] keeps frames in memory.

use crate::error::SinkError;
use crate::frame::Frame;
use crate::machine::MachineConfig;
use crate::meta::SessionMetadata;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Ordered frame store
pub trait TraceSink {
    /// Append one finished frame
    fn append(&mut self, frame: Frame) -> Result<(), SinkError>;

    /// Flush everything and close; closing twice is a no-op
    fn close(&mut self) -> Result<(), SinkError>;

    /// Number of frames appended so far
    fn frames_written(&self) -> u64;
}

/// First line of a trace file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceHeader {
    pub metadata: SessionMetadata,
    #[serde(flatten)]
    pub machine: MachineConfig,
}

/// JSON-lines trace file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    frames: u64,
}

impl JsonLinesSink {
    /// Create the trace file and write its header
    pub fn open(
        path: impl Into<PathBuf>,
        metadata: &SessionMetadata,
        machine: MachineConfig,
    ) -> Result<Self, SinkError> {
        let path = path.into();
        let mut writer = BufWriter::new(File::create(&path)?);

        let header = TraceHeader {
            metadata: metadata.clone(),
            machine,
        };
        serde_json::to_writer(&mut writer, &header)?;
        writer.write_all(b"\n")?;

        tracing::info!("Opened trace {} for {}", path.display(), machine);

        Ok(Self {
            path,
            writer: Some(writer),
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl TraceSink for JsonLinesSink {
    fn append(&mut self, frame: Frame) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        serde_json::to_writer(&mut *writer, &frame)?;
        writer.write_all(b"\n")?;
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|e| SinkError::Io(e.into_error()))?;
        file.sync_all()?;
        tracing::info!("Closed trace {} after {} frames", self.path.display(), self.frames);
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }
}

/// Load a JSON-lines trace file back into its header and frames
pub fn read_trace(path: impl AsRef<Path>) -> Result<(TraceHeader, Vec<Frame>), SinkError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or(SinkError::MissingHeader)??;
    let header: TraceHeader = serde_json::from_str(&header_line)?;

    let mut frames = Vec::new();
    for line in lines {
        let line = line?;
        if !line.is_empty() {
            frames.push(serde_json::from_str(&line)?);
        }
    }
    Ok((header, frames))
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl TraceSink for MemorySink {
    fn append(&mut self, frame: Frame) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.frames.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames.len() as u64
    }
}
