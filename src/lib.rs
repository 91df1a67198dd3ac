//! License plate recognition stage.
//!
//! `plategate` consumes video frames and produces three independent output
//! streams: the (optionally annotated) frame as JPEG bytes, structured
//! per-frame recognition results, and deduplicated attendance events.
//!
//! The detection and OCR models are external collaborators behind the
//! [`PlateDetector`] and [`OcrEngine`] traits; stub implementations are
//! provided so hosts and tests can exercise the wiring without models.
//! The host drives the stage through [`RecognitionPipeline`]: construct,
//! `start`, feed frames through `process` one at a time, `stop`.

pub mod annotate;
pub mod attendance;
pub mod config;
pub mod detect;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolve;

pub use annotate::FrameAnnotator;
pub use attendance::AttendanceTracker;
pub use config::{AnnotationStyle, OcrParams, RecognitionConfig, SinkPaths};
pub use detect::{DetectionBox, PlateDetector, StubDetector};
pub use ocr::{OcrEngine, StubOcr, TextFragment};
pub use output::{ByteSink, FileSink, MemorySink, OutputRouter};
pub use pipeline::RecognitionPipeline;
pub use registry::PlateRegistry;
pub use resolve::Resolution;

use serde::Serialize;

/// One recognized (or unrecognized) plate for one detection box.
///
/// Immutable once pushed into the per-frame result list. The serialized
/// field names are the wire format of the results payload.
#[derive(Clone, Debug, Serialize)]
pub struct PlateResult {
    /// Registry name when known, otherwise the assembled text.
    pub label: String,
    /// Assembled OCR text exactly as read, before any match normalization.
    pub license_plate: String,
    /// Whether the text matched a registry entry above the threshold.
    pub known: bool,
    /// Detector confidence for the bounding box.
    pub detection_score: f32,
    /// Mean confidence of the OCR fragments that survived filtering.
    pub ocr_score: f32,
    /// Best fuzzy-match score against the registry (0-100).
    pub similarity_score: f64,
    /// Bounding box as `[x1, y1, x2, y2]` frame pixel coordinates.
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
}
