use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::ByteSink;

/// In-memory sink for tests and wiring checks. Clones share one buffer, so
/// a test can hand a clone to the router and inspect the original.
#[derive(Clone, Default)]
pub struct MemorySink {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.payloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.payloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(payload.to_vec());
        Ok(())
    }
}
