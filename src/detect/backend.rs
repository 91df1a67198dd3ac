use anyhow::Result;
use image::RgbImage;

/// Axis-aligned region the detector proposes as containing a plate.
///
/// Coordinates are frame pixels and may fall outside the frame; the
/// pipeline clamps before cropping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub confidence: f32,
    pub class_id: u32,
}

/// Plate detector contract.
///
/// Implementations wrap an object-detection model. `detect` blocks for the
/// duration of inference; the pipeline defines no timeout and propagates
/// failures to the host, which owns the retry-or-skip-frame decision.
pub trait PlateDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one frame. May return an empty list.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<DetectionBox>>;

    /// Optional warm-up hook, called once at pipeline start.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
