use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::resolve::fold_confusables;

/// Known plate/name associations, loaded once and read-only during frame
/// processing.
///
/// Invariant: `names` and `plates` have equal length and index `i` of one
/// belongs to index `i` of the other.
#[derive(Clone, Debug, Default)]
pub struct PlateRegistry {
    names: Vec<String>,
    plates: Vec<String>,
}

impl PlateRegistry {
    /// Load a JSON object mapping plate identifier to person name.
    ///
    /// Unreadable or malformed sources fail the load; the caller decides
    /// whether that is fatal or the pipeline degrades to no-registry mode.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plate registry {}", path.display()))?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed plate registry {}", path.display()))?;
        Self::from_entries(entries)
            .with_context(|| format!("invalid plate registry {}", path.display()))
    }

    fn from_entries(entries: BTreeMap<String, String>) -> Result<Self> {
        let syntax = Regex::new(r"^[A-Z0-9]+$").context("plate identifier pattern")?;

        let mut names = Vec::with_capacity(entries.len());
        let mut plates: Vec<String> = Vec::with_capacity(entries.len());
        for (stored, name) in entries {
            if name.trim().is_empty() {
                return Err(anyhow!("plate '{}' has an empty name", stored));
            }
            let plate = canonical_plate(&stored);
            if !syntax.is_match(&plate) {
                return Err(anyhow!("'{}' is not a valid plate identifier", stored));
            }
            if let Some(existing) = plates.iter().position(|p| *p == plate) {
                log::warn!(
                    "registry entries collide on plate {}, keeping the later name",
                    plate
                );
                names[existing] = name;
            } else {
                plates.push(plate);
                names.push(name);
            }
        }

        Ok(Self { names, plates })
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    /// Canonicalized plate identifiers, index-aligned with `names`.
    pub fn plates(&self) -> &[String] {
        &self.plates
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Canonicalize a stored plate identifier into the order and alphabet OCR
/// produces when scanning the physical plate: uppercase, display separators
/// stripped, confusable characters folded with the resolver's table.
pub fn canonical_plate(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.'))
        .collect();
    fold_confusables(&stripped)
}
