use std::collections::VecDeque;

use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::{DetectionBox, PlateDetector};

/// Stub detector for tests and the demo binary.
///
/// Replays a scripted sequence of per-frame detections, then reports empty
/// frames once the script is exhausted.
pub struct StubDetector {
    script: VecDeque<Vec<DetectionBox>>,
}

impl StubDetector {
    /// A detector that never finds anything.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    /// One script entry per upcoming frame, consumed in order.
    pub fn with_script(script: Vec<Vec<DetectionBox>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlateDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<DetectionBox>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}
