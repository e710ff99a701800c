//! Frame writer
//!
//! Routes every [`Event`] either into the [`FrameAccumulator`] or straight
//! to the sink, and owns the sink for the lifetime of the session.

use crate::accumulator::FrameAccumulator;
use crate::error::FrameError;
use crate::event::Event;
use crate::frame::{Frame, InstructionFrame, ModuleLoadFrame, SyscallFrame};
use crate::operand::Usage;
use crate::sink::TraceSink;

/// What happened to a handled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Added to the open instruction frame, or opened a new one
    Buffered,
    /// Turned into a frame and appended immediately
    Written,
    /// Not recorded by the frames format
    Skipped,
}

/// Frame counts for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub instructions: u64,
    pub modules: u64,
    pub syscalls: u64,
    pub skipped: u64,
}

/// Converts an event stream into frames and writes them to a sink
pub struct FrameWriter<S: TraceSink> {
    sink: S,
    accumulator: FrameAccumulator,
    stats: WriterStats,
    finished: bool,
}

impl<S: TraceSink> FrameWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            accumulator: FrameAccumulator::new(),
            stats: WriterStats::default(),
            finished: false,
        }
    }

    /// Process one event to completion
    ///
    /// Fails once the writer has been finished.
    pub fn handle(&mut self, event: Event) -> Result<Handled, FrameError> {
        let kind = event.kind();
        if self.finished {
            return Err(FrameError::Finished { event: kind });
        }
        match event {
            Event::OperationStart { address, thread_id, bytes } => {
                if let Some(prev) = self.accumulator.start(address, thread_id, bytes) {
                    self.write_instruction(prev)?;
                }
                Ok(Handled::Buffered)
            }
            Event::RegisterRead(r) => {
                self.accumulator.add_register(kind, Usage::Read, &r.name, &r.bytes, r.width)?;
                Ok(Handled::Buffered)
            }
            Event::RegisterWrite(r) => {
                self.accumulator.add_register(kind, Usage::Write, &r.name, &r.bytes, r.width)?;
                Ok(Handled::Buffered)
            }
            Event::MemoryRead(m) => {
                self.accumulator.add_memory(kind, Usage::Read, m.address, &m.bytes)?;
                Ok(Handled::Buffered)
            }
            Event::MemoryWrite(m) => {
                self.accumulator.add_memory(kind, Usage::Write, m.address, &m.bytes)?;
                Ok(Handled::Buffered)
            }
            Event::FlagsRead(fl) => {
                self.accumulator.add_flags(kind, Usage::Read, &fl.flags, &fl.bytes)?;
                Ok(Handled::Buffered)
            }
            Event::FlagsWrite(fl) => {
                self.accumulator.add_flags(kind, Usage::Write, &fl.flags, &fl.bytes)?;
                Ok(Handled::Buffered)
            }
            Event::ModuleLoad { name, low, high } => {
                tracing::debug!("Module {} loaded at {:#x}-{:#x}", name, low, high);
                self.append(Frame::ModLoad(ModuleLoadFrame {
                    module_name: name,
                    low_address: low,
                    high_address: high,
                }))?;
                self.stats.modules += 1;
                Ok(Handled::Written)
            }
            Event::SystemCall { address, thread_id, number, args } => {
                self.append(Frame::Syscall(SyscallFrame {
                    address,
                    thread_id,
                    number,
                    arguments: args,
                }))?;
                self.stats.syscalls += 1;
                Ok(Handled::Written)
            }
            Event::Unsupported { description } => {
                tracing::warn!("Skipped event {} in frames protocol", description);
                self.stats.skipped += 1;
                Ok(Handled::Skipped)
            }
        }
    }

    /// Process a sequence of events in order
    pub fn handle_all<I>(&mut self, events: I) -> Result<(), FrameError>
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Write the open instruction frame, if any, without closing the sink
    pub fn flush_open(&mut self) -> Result<(), FrameError> {
        match self.accumulator.finish() {
            Some(frame) => self.write_instruction(frame),
            None => Ok(()),
        }
    }

    /// End the session: write the open frame and close the sink
    ///
    /// The sink is closed even when writing the open frame fails; the first
    /// error is returned. Calling this more than once is a no-op.
    pub fn finish(&mut self) -> Result<WriterStats, FrameError> {
        if self.finished {
            return Ok(self.stats);
        }
        self.finished = true;
        let flushed = self.flush_open();
        let closed = self.sink.close().map_err(FrameError::Teardown);
        if let Err(e) = &closed {
            if flushed.is_err() {
                tracing::error!("Close after failed flush also failed: {}", e);
            }
        }
        flushed?;
        closed?;
        tracing::info!(
            "Frames written: {} instructions, {} modules, {} syscalls ({} events skipped)",
            self.stats.instructions,
            self.stats.modules,
            self.stats.syscalls,
            self.stats.skipped
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The instruction frame under construction
    pub fn open_frame(&self) -> Option<&InstructionFrame> {
        self.accumulator.current()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn write_instruction(&mut self, frame: InstructionFrame) -> Result<(), FrameError> {
        tracing::debug!(
            "Instruction {:#x} tid={} with {} operands",
            frame.address,
            frame.thread_id,
            frame.operand_count()
        );
        self.append(Frame::Std(frame))?;
        self.stats.instructions += 1;
        Ok(())
    }

    fn append(&mut self, frame: Frame) -> Result<(), FrameError> {
        self.sink.append(frame).map_err(FrameError::Sink)
    }
}

impl<S: TraceSink> Drop for FrameWriter<S> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::error!("finish failed with: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::event::{FlagsAccess, MemoryAccess, RegisterAccess};
    use crate::flags::{x86, FlagEffect};
    use crate::operand::{OperandInfo, OperandLocation};
    use crate::sink::MemorySink;

    fn op(address: u64, bytes: &[u8]) -> Event {
        Event::OperationStart { address, thread_id: 1, bytes: bytes.to_vec() }
    }

    fn mem_read(address: u64, bytes: &[u8]) -> Event {
        Event::MemoryRead(MemoryAccess { address, bytes: bytes.to_vec() })
    }

    fn mem_write(address: u64, bytes: &[u8]) -> Event {
        Event::MemoryWrite(MemoryAccess { address, bytes: bytes.to_vec() })
    }

    fn module(name: &str) -> Event {
        Event::ModuleLoad { name: name.into(), low: 0x7f00_0000, high: 0x7f10_0000 }
    }

    #[test]
    fn test_read_write_scenario() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.handle(op(0x400000, &[0x90])).unwrap();
        writer.handle(mem_read(0x1000, &[0x01])).unwrap();
        writer.handle(mem_write(0x1000, &[0x02])).unwrap();
        assert!(writer.sink().frames().is_empty());

        writer.handle(op(0x400001, &[0x91])).unwrap();

        // exactly the first frame is out, the second one is still open
        let frames = writer.sink().frames();
        assert_eq!(frames.len(), 1);
        let frame = frames[0].as_instruction().unwrap();
        assert_eq!(frame.address, 0x400000);
        assert_eq!(frame.raw_bytes, vec![0x90]);

        assert_eq!(frame.pre_operands.len(), 1);
        let pre = &frame.pre_operands[0];
        assert_eq!(pre.location, OperandLocation::Memory { address: 0x1000 });
        assert_eq!(pre.value, vec![0x01]);
        assert_eq!(pre.bit_length, 8);

        assert_eq!(frame.post_operands.len(), 1);
        let post = &frame.post_operands[0];
        assert_eq!(post.location, OperandLocation::Memory { address: 0x1000 });
        assert_eq!(post.value, vec![0x02]);
        assert_eq!(post.bit_length, 8);

        assert_eq!(writer.open_frame().unwrap().address, 0x400001);
    }

    #[test]
    fn test_module_load_mid_instruction() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.handle(op(0x10, &[0x90])).unwrap();
        writer.handle(mem_read(0x1000, &[0xaa])).unwrap();

        assert_eq!(writer.handle(module("libc.so.6")).unwrap(), Handled::Written);
        assert_eq!(writer.sink().frames().len(), 1);
        assert_eq!(writer.sink().frames()[0].kind(), "modload");

        let open = writer.open_frame().unwrap();
        assert_eq!(open.address, 0x10);
        assert_eq!(open.pre_operands.len(), 1);
        assert!(open.post_operands.is_empty());

        writer.finish().unwrap();
        let kinds: Vec<_> = writer.sink().frames().iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["modload", "std"]);
    }

    #[test]
    fn test_syscall_preserves_argument_order() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer
            .handle(Event::SystemCall {
                address: 0x401000,
                thread_id: 3,
                number: 1,
                args: vec![3, 1, 2],
            })
            .unwrap();
        match &writer.sink().frames()[0] {
            Frame::Syscall(s) => {
                assert_eq!(s.number, 1);
                assert_eq!(s.thread_id, 3);
                assert_eq!(s.arguments, vec![3, 1, 2]);
            }
            other => panic!("unexpected frame {:?}", other),
        }
        assert_eq!(writer.stats().syscalls, 1);
    }

    #[test]
    fn test_operand_before_any_instruction() {
        let mut writer = FrameWriter::new(MemorySink::new());
        let err = writer
            .handle(Event::RegisterRead(RegisterAccess {
                name: "eax".into(),
                width: 0,
                bytes: vec![0; 4],
            }))
            .unwrap_err();
        assert!(matches!(err, FrameError::Usage { event: "register_read" }));
    }

    #[test]
    fn test_unsupported_event_is_skipped() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.handle(op(0x10, &[])).unwrap();
        let handled = writer
            .handle(Event::Unsupported { description: "exception".into() })
            .unwrap();
        assert_eq!(handled, Handled::Skipped);
        assert_eq!(writer.stats().skipped, 1);
        assert!(writer.open_frame().is_some());
    }

    #[test]
    fn test_flags_events() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.handle(op(0x10, &[0x72, 0x00])).unwrap();
        writer
            .handle(Event::FlagsRead(FlagsAccess {
                flags: x86::eflags_with(&["CF"], FlagEffect::READ),
                bytes: vec![0x01, 0, 0, 0],
            }))
            .unwrap();
        writer
            .handle(Event::FlagsWrite(FlagsAccess {
                flags: x86::eflags_with(&["ZF", "SF"], FlagEffect::WRITE),
                bytes: vec![0x40, 0, 0, 0],
            }))
            .unwrap();
        writer.finish().unwrap();

        let frame = writer.sink().frames()[0].as_instruction().unwrap().clone();
        let summary = |ops: &[OperandInfo]| -> Vec<(OperandLocation, Vec<u8>)> {
            ops.iter().map(|o| (o.location.clone(), o.value.clone())).collect()
        };
        let pre = summary(&frame.pre_operands[..]);
        let post = summary(&frame.post_operands[..]);
        assert_eq!(pre, vec![(OperandLocation::Register { name: "CF".into() }, vec![1])]);
        assert_eq!(
            post,
            vec![
                (OperandLocation::Register { name: "ZF".into() }, vec![1]),
                (OperandLocation::Register { name: "SF".into() }, vec![0]),
            ]
        );
    }

    #[test]
    fn test_each_start_finalizes_exactly_one_frame() {
        let mut writer = FrameWriter::new(MemorySink::new());
        for (i, address) in (0x100..0x105u64).enumerate() {
            writer.handle(op(address, &[0x90])).unwrap();
            assert_eq!(writer.sink().frames().len(), i);
        }
        writer.finish().unwrap();
        assert_eq!(writer.stats().instructions, 5);
        assert_eq!(writer.sink().frames().len(), 5);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.finish().unwrap();
        writer.finish().unwrap();
        assert!(writer.sink().frames().is_empty());
        assert!(writer.sink().is_closed());
        assert!(writer.is_finished());
    }

    /// Sink whose close always fails
    #[derive(Default)]
    struct BrokenSink {
        frames: u64,
    }

    impl TraceSink for BrokenSink {
        fn append(&mut self, _frame: Frame) -> Result<(), SinkError> {
            self.frames += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }

        fn frames_written(&self) -> u64 {
            self.frames
        }
    }

    #[test]
    fn test_teardown_error_reported_on_finish() {
        let mut writer = FrameWriter::new(BrokenSink::default());
        writer.handle(op(0x10, &[])).unwrap();
        let err = writer.finish().unwrap_err();
        assert!(matches!(err, FrameError::Teardown(_)));
        assert_eq!(writer.sink().frames_written(), 1);
    }

    #[test]
    fn test_drop_swallows_teardown_error() {
        let mut writer = FrameWriter::new(BrokenSink::default());
        writer.handle(op(0x10, &[])).unwrap();
        drop(writer);
    }

    /// Sink that accepts nothing but closes cleanly
    #[derive(Default)]
    struct FullSink {
        closed: bool,
    }

    impl TraceSink for FullSink {
        fn append(&mut self, _frame: Frame) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.closed = true;
            Ok(())
        }

        fn frames_written(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_failed_flush_still_closes_sink() {
        let mut writer = FrameWriter::new(FullSink::default());
        writer.handle(op(0x10, &[])).unwrap();

        let err = writer.finish().unwrap_err();
        assert!(matches!(err, FrameError::Sink(_)));
        assert!(writer.sink().closed);
        assert!(writer.open_frame().is_none());
    }

    #[test]
    fn test_events_after_finish_are_rejected() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer.finish().unwrap();

        let err = writer.handle(op(0x10, &[0x90])).unwrap_err();
        assert!(matches!(err, FrameError::Finished { event: "operation_start" }));
        assert!(writer.open_frame().is_none());

        let err = writer.handle(module("late.so")).unwrap_err();
        assert!(matches!(err, FrameError::Finished { event: "module_load" }));
        assert!(writer.sink().frames().is_empty());
    }

    #[test]
    fn test_handle_all() {
        let mut writer = FrameWriter::new(MemorySink::new());
        writer
            .handle_all(vec![
                op(0x1, &[]),
                mem_read(0x10, &[1, 2, 3, 4]),
                op(0x2, &[]),
                module("a.so"),
            ])
            .unwrap();
        let kinds: Vec<_> = writer.sink().frames().iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["std", "modload"]);
        let first = writer.sink().frames()[0].as_instruction().unwrap();
        assert_eq!(first.pre_operands[0].bit_length, 32);
    }
}
