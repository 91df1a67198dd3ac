mod file;
mod stub;

pub use file::FileSink;
pub use stub::MemorySink;

use anyhow::Result;

/// Downstream consumer of one output byte stream.
///
/// Payloads are opaque bytes; the sink neither inspects nor re-frames them.
pub trait ByteSink: Send {
    /// Sink identifier for log lines.
    fn name(&self) -> &str;

    /// Called by the pipeline's `start`.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called by the pipeline's `stop`. Must be safe without a prior start.
    fn stop(&mut self) {}

    fn send(&mut self, payload: &[u8]) -> Result<()>;
}

/// Fan-out to the three independent output streams: frame, results,
/// attendance.
///
/// Each send is a no-op when the stream has no sink, and sink failures are
/// logged and swallowed so a broken consumer never aborts frame processing.
/// Backpressure toward sinks is intentionally not handled.
#[derive(Default)]
pub struct OutputRouter {
    frame: Option<Box<dyn ByteSink>>,
    results: Option<Box<dyn ByteSink>>,
    attendance: Option<Box<dyn ByteSink>>,
}

impl OutputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_sink(mut self, sink: Box<dyn ByteSink>) -> Self {
        self.frame = Some(sink);
        self
    }

    pub fn with_results_sink(mut self, sink: Box<dyn ByteSink>) -> Self {
        self.results = Some(sink);
        self
    }

    pub fn with_attendance_sink(mut self, sink: Box<dyn ByteSink>) -> Self {
        self.attendance = Some(sink);
        self
    }

    pub fn wants_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn wants_results(&self) -> bool {
        self.results.is_some()
    }

    pub fn wants_attendance(&self) -> bool {
        self.attendance.is_some()
    }

    /// Start every configured sink.
    pub fn start(&mut self) -> Result<()> {
        for sink in [&mut self.frame, &mut self.results, &mut self.attendance]
            .into_iter()
            .flatten()
        {
            sink.start()?;
        }
        Ok(())
    }

    /// Stop every configured sink. Safe without a prior start.
    pub fn stop(&mut self) {
        for sink in [&mut self.frame, &mut self.results, &mut self.attendance]
            .into_iter()
            .flatten()
        {
            sink.stop();
        }
    }

    pub fn send_frame(&mut self, payload: &[u8]) {
        Self::dispatch(&mut self.frame, "frame", payload);
    }

    pub fn send_results(&mut self, payload: &[u8]) {
        Self::dispatch(&mut self.results, "results", payload);
    }

    pub fn send_attendance(&mut self, payload: &[u8]) {
        Self::dispatch(&mut self.attendance, "attendance", payload);
    }

    fn dispatch(sink: &mut Option<Box<dyn ByteSink>>, stream: &str, payload: &[u8]) {
        if let Some(sink) = sink {
            if let Err(err) = sink.send(payload) {
                log::warn!("{} sink '{}' send failed: {}", stream, sink.name(), err);
            }
        }
    }
}
