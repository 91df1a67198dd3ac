use std::collections::VecDeque;

use anyhow::Result;
use image::GrayImage;

use crate::config::OcrParams;
use crate::ocr::{OcrEngine, TextFragment};

/// Stub OCR engine for tests and the demo binary.
///
/// Replays a scripted sequence of fragment sets, one per `read_text` call,
/// then returns empty sets.
pub struct StubOcr {
    script: VecDeque<Vec<TextFragment>>,
}

impl StubOcr {
    /// An engine that never reads anything.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    /// One script entry per upcoming call, consumed in order.
    pub fn with_script(script: Vec<Vec<TextFragment>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Default for StubOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for StubOcr {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn read_text(&mut self, _crop: &GrayImage, _params: &OcrParams) -> Result<Vec<TextFragment>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}
