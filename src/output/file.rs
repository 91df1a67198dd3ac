use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use super::ByteSink;

/// Appends payloads to a local file.
///
/// The results and attendance streams are newline-delimited JSON, so their
/// files are directly tailable; the frame stream appends raw JPEG buffers.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }
}

impl ByteSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn start(&mut self) -> Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("failed to open sink file {}", self.path.display()))?;
            self.file = Some(file);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.file = None;
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| anyhow!("sink file {} not started", self.path.display()))?;
        file.write_all(payload)?;
        file.flush()?;
        Ok(())
    }
}
