use std::collections::HashMap;
use std::time::Duration;

use crate::PlateResult;

/// Time-windowed deduplication of known-identity sightings.
///
/// State is private to one pipeline instance and assumes serialized,
/// monotonic `now` values across calls. It survives across frames until
/// `reset` (pipeline stop).
pub struct AttendanceTracker {
    interval_secs: u64,
    last_seen: HashMap<String, u64>,
}

impl AttendanceTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_secs: interval.as_secs(),
            last_seen: HashMap::new(),
        }
    }

    /// Names whose sighting should be reported for this frame, in result
    /// order. `now` is unix seconds.
    ///
    /// The last-seen stamp is written after the interval check, so a second
    /// sighting of the same name within one call sees the fresh stamp and
    /// stays quiet.
    pub fn update(&mut self, results: &[PlateResult], now: u64) -> Vec<String> {
        let mut names = Vec::new();
        for result in results {
            if !result.known {
                continue;
            }
            let name = result.label.as_str();
            let due = match self.last_seen.get(name) {
                None => true,
                Some(&last) => now.saturating_sub(last) > self.interval_secs,
            };
            if due {
                names.push(name.to_string());
            }
            self.last_seen.insert(name.to_string(), now);
        }
        names
    }

    /// Forget everything. Called on pipeline stop.
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
