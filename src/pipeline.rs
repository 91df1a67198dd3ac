use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use image::{GrayImage, RgbImage};

use crate::annotate::FrameAnnotator;
use crate::attendance::AttendanceTracker;
use crate::config::RecognitionConfig;
use crate::detect::{DetectionBox, PlateDetector};
use crate::ocr::{assemble, OcrEngine};
use crate::output::OutputRouter;
use crate::registry::PlateRegistry;
use crate::resolve::resolve;
use crate::PlateResult;

/// Per-frame license plate recognition stage.
///
/// The host constructs one instance per stream, calls `start`, feeds frames
/// through `process` strictly one at a time, and calls `stop`. Attendance
/// deduplication assumes serialized, monotonic frame timestamps, so a
/// pipeline instance must never be shared across concurrently processed
/// streams; frame N completes (or is abandoned) before frame N+1 begins.
pub struct RecognitionPipeline {
    config: RecognitionConfig,
    detector: Box<dyn PlateDetector>,
    ocr: Box<dyn OcrEngine>,
    registry: Option<PlateRegistry>,
    annotator: FrameAnnotator,
    attendance: AttendanceTracker,
    router: OutputRouter,
    started: bool,
}

impl RecognitionPipeline {
    /// A missing registry is fatal when the config demands one; otherwise
    /// the stage runs in no-registry mode and reports every plate unknown.
    pub fn new(
        config: RecognitionConfig,
        detector: Box<dyn PlateDetector>,
        ocr: Box<dyn OcrEngine>,
        registry: Option<PlateRegistry>,
        router: OutputRouter,
    ) -> Result<Self> {
        if config.require_registry && registry.is_none() {
            return Err(anyhow!("plate registry required but none was provided"));
        }
        if registry.is_none() {
            log::info!("no plate registry loaded, every plate will be reported unknown");
        }
        let annotator = FrameAnnotator::new(config.annotation.clone());
        let attendance = AttendanceTracker::new(config.attendance_interval);
        Ok(Self {
            config,
            detector,
            ocr,
            registry,
            annotator,
            attendance,
            router,
            started: false,
        })
    }

    /// Idempotent. Starts configured sinks and warms the detector up.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.router.start().context("failed to start output sinks")?;
        self.detector.warm_up().context("detector warm-up failed")?;
        self.started = true;
        log::info!(
            "recognition pipeline started (detector: {}, ocr: {})",
            self.detector.name(),
            self.ocr.name()
        );
        Ok(())
    }

    /// Idempotent and safe without a prior `start`. Stops sinks and resets
    /// attendance state.
    pub fn stop(&mut self) {
        self.router.stop();
        self.attendance.reset();
        if self.started {
            log::info!("recognition pipeline stopped");
        }
        self.started = false;
    }

    /// Run one frame through detection, OCR, identity resolution,
    /// annotation and output fan-out. Side effects only via the router.
    ///
    /// Detector and OCR failures propagate with stage context; the host
    /// owns the retry-or-skip-frame decision. Frame encoding failures and
    /// sink errors are logged and never abort the frame.
    pub fn process(&mut self, frame: &mut RgbImage) -> Result<()> {
        let boxes = self
            .detector
            .detect(frame)
            .context("plate detection stage failed")?;
        log::debug!("{} plate candidates in frame", boxes.len());

        let mut results = Vec::with_capacity(boxes.len());
        for bx in &boxes {
            results.push(self.recognize(frame, bx)?);
        }

        if self.router.wants_frame() {
            if self.config.annotate {
                self.annotator.annotate(frame, &results);
            }
            match encode_jpeg(frame) {
                Ok(bytes) => self.router.send_frame(&bytes),
                Err(err) => log::warn!("frame encoding failed, skipping frame send: {err:#}"),
            }
        }

        let now = unix_now()?;
        if !results.is_empty() && self.router.wants_results() {
            self.router.send_results(&results_payload(now, &results)?);
        }

        let names = self.attendance.update(&results, now);
        if !names.is_empty() && self.router.wants_attendance() {
            self.router.send_attendance(&attendance_payload(now, &names)?);
        }
        Ok(())
    }

    fn recognize(&mut self, frame: &RgbImage, bx: &DetectionBox) -> Result<PlateResult> {
        let (text, ocr_score) =
            match crop_region(frame, bx, self.config.expand_x, self.config.expand_y) {
                None => (String::new(), 0.0),
                Some(crop) => {
                    let fragments = self
                        .ocr
                        .read_text(&crop, &self.config.ocr)
                        .context("ocr stage failed")?;
                    assemble(
                        &fragments,
                        crop.width(),
                        crop.height(),
                        self.config.min_text_area_fraction,
                        self.config.sorting_tolerance,
                    )
                }
            };

        let resolution = resolve(&text, self.registry.as_ref(), self.config.similarity_threshold);
        Ok(PlateResult {
            label: resolution.label,
            license_plate: text,
            known: resolution.known,
            detection_score: bx.confidence,
            ocr_score,
            similarity_score: resolution.similarity,
            bbox: [bx.x1, bx.y1, bx.x2, bx.y2],
        })
    }
}

/// Expand the detection box by the crop padding, clamp to frame bounds, and
/// return the grayscale crop. `None` when the clamped region is empty.
fn crop_region(
    frame: &RgbImage,
    bx: &DetectionBox,
    expand_x: u32,
    expand_y: u32,
) -> Option<GrayImage> {
    let frame_w = frame.width() as i64;
    let frame_h = frame.height() as i64;
    let x1 = (bx.x1 as i64 - expand_x as i64).clamp(0, frame_w);
    let y1 = (bx.y1 as i64 - expand_y as i64).clamp(0, frame_h);
    let x2 = (bx.x2 as i64 + expand_x as i64).clamp(0, frame_w);
    let y2 = (bx.y2 as i64 + expand_y as i64).clamp(0, frame_h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    let crop = image::imageops::crop_imm(
        frame,
        x1 as u32,
        y1 as u32,
        (x2 - x1) as u32,
        (y2 - y1) as u32,
    )
    .to_image();
    Some(image::imageops::grayscale(&crop))
}

fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    frame
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .context("jpeg encoding failed")?;
    Ok(buf.into_inner())
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs())
}

fn results_payload(now: u64, results: &[PlateResult]) -> Result<Vec<u8>> {
    keyed_payload(now, serde_json::to_value(results).context("results payload")?)
}

fn attendance_payload(now: u64, names: &[String]) -> Result<Vec<u8>> {
    keyed_payload(now, serde_json::to_value(names).context("attendance payload")?)
}

/// `{"<unix secs>": <body>}` with a trailing newline, so sink files are
/// newline-delimited JSON.
fn keyed_payload(now: u64, body: serde_json::Value) -> Result<Vec<u8>> {
    let mut map = serde_json::Map::with_capacity(1);
    map.insert(now.to_string(), body);
    let mut bytes =
        serde_json::to_vec(&serde_json::Value::Object(map)).context("payload encoding failed")?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x1: i32, y1: i32, x2: i32, y2: i32) -> DetectionBox {
        DetectionBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.8,
            class_id: 0,
        }
    }

    #[test]
    fn crop_clamps_to_frame_bounds() {
        let frame = RgbImage::new(100, 50);
        let crop = crop_region(&frame, &bx(-10, -10, 30, 20), 0, 0).expect("crop");
        assert_eq!((crop.width(), crop.height()), (30, 20));
    }

    #[test]
    fn crop_expansion_is_applied_then_clamped() {
        let frame = RgbImage::new(100, 50);
        let crop = crop_region(&frame, &bx(10, 10, 30, 20), 5, 40).expect("crop");
        assert_eq!((crop.width(), crop.height()), (30, 50));
    }

    #[test]
    fn crop_outside_frame_is_empty() {
        let frame = RgbImage::new(100, 50);
        assert!(crop_region(&frame, &bx(200, 10, 240, 20), 0, 0).is_none());
        assert!(crop_region(&frame, &bx(30, 20, 10, 10), 0, 0).is_none());
    }

    #[test]
    fn results_payload_shape() {
        let results = vec![PlateResult {
            label: "Alice".to_string(),
            license_plate: "AB1234".to_string(),
            known: true,
            detection_score: 0.8,
            ocr_score: 0.9,
            similarity_score: 100.0,
            bbox: [1, 2, 3, 4],
        }];
        let bytes = results_payload(1_700_000_000, &results).expect("payload");
        assert_eq!(*bytes.last().expect("non-empty"), b'\n');

        let value: serde_json::Value =
            serde_json::from_slice(&bytes[..bytes.len() - 1]).expect("json");
        let entry = &value["1700000000"][0];
        assert_eq!(entry["label"], "Alice");
        assert_eq!(entry["license_plate"], "AB1234");
        assert_eq!(entry["known"], true);
        assert_eq!(entry["similarity_score"], 100.0);
        assert_eq!(entry["box"], serde_json::json!([1, 2, 3, 4]));
    }

    #[test]
    fn attendance_payload_shape() {
        let bytes =
            attendance_payload(1_700_000_000, &["Alice".to_string(), "Bob".to_string()])
                .expect("payload");
        assert_eq!(
            bytes,
            b"{\"1700000000\":[\"Alice\",\"Bob\"]}\n".to_vec()
        );
    }

    #[test]
    fn encoded_frame_is_jpeg() {
        let frame = RgbImage::new(16, 16);
        let bytes = encode_jpeg(&frame).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
