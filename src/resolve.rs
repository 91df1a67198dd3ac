use crate::registry::PlateRegistry;

/// Outcome of resolving assembled plate text against the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Registry name when known, otherwise the assembled text verbatim.
    pub label: String,
    pub known: bool,
    /// Best match score on the 0-100 fuzzy scale.
    pub similarity: f64,
}

impl Resolution {
    fn unknown(label: impl Into<String>, similarity: f64) -> Self {
        Self {
            label: label.into(),
            known: false,
            similarity,
        }
    }
}

/// Character pairs OCR commonly confuses on plates, folded letter-to-digit.
const CONFUSABLE_PAIRS: [(char, char); 6] = [
    ('O', '0'),
    ('I', '1'),
    ('Z', '2'),
    ('S', '5'),
    ('G', '6'),
    ('B', '8'),
];

/// Fold confusable characters onto one representative so "O" and "0" (and
/// friends) compare equal during matching. Applied to the query here and to
/// stored identifiers at registry load; both sides must share the table.
pub fn fold_confusables(text: &str) -> String {
    text.chars()
        .map(|c| {
            CONFUSABLE_PAIRS
                .iter()
                .find(|(letter, _)| *letter == c)
                .map(|(_, digit)| *digit)
                .unwrap_or(c)
        })
        .collect()
}

/// Match assembled text against the registry and decide known/unknown.
///
/// The match score must be strictly above `similarity_threshold` to count
/// as known; an exact hit on the threshold stays unknown. Ties between
/// candidates go to the lower index.
pub fn resolve(
    text: &str,
    registry: Option<&PlateRegistry>,
    similarity_threshold: f64,
) -> Resolution {
    if text.is_empty() {
        return Resolution::unknown("", 0.0);
    }
    let registry = match registry {
        Some(registry) if !registry.is_empty() => registry,
        _ => return Resolution::unknown(text, 0.0),
    };

    let query = fold_confusables(text);
    let mut best_score = f64::MIN;
    let mut best_index = 0;
    for (index, plate) in registry.plates().iter().enumerate() {
        let score = rapidfuzz::fuzz::ratio(query.chars(), plate.chars());
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    if best_score > similarity_threshold {
        Resolution {
            label: registry.names()[best_index].clone(),
            known: true,
            similarity: best_score,
        }
    } else {
        Resolution::unknown(text, best_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn registry(pairs: &[(&str, &str)]) -> PlateRegistry {
        let mut file = tempfile::NamedTempFile::new().expect("temp registry");
        let entries: BTreeMap<&str, &str> = pairs.iter().copied().collect();
        serde_json::to_writer(&mut file, &entries).expect("write registry");
        PlateRegistry::load(file.path()).expect("load registry")
    }

    #[test]
    fn empty_text_resolves_empty_unknown() {
        let reg = registry(&[("AB1234", "Alice")]);
        let res = resolve("", Some(&reg), 90.0);
        assert_eq!(res, Resolution::unknown("", 0.0));
    }

    #[test]
    fn missing_registry_keeps_text_as_label() {
        let res = resolve("AB1234", None, 90.0);
        assert_eq!(res, Resolution::unknown("AB1234", 0.0));
    }

    #[test]
    fn empty_registry_keeps_text_as_label() {
        let reg = PlateRegistry::default();
        let res = resolve("AB1234", Some(&reg), 90.0);
        assert_eq!(res, Resolution::unknown("AB1234", 0.0));
    }

    #[test]
    fn exact_match_is_known_with_full_score() {
        let reg = registry(&[("AB1234", "Alice"), ("CD5678", "Carol")]);
        let res = resolve("AB1234", Some(&reg), 90.0);
        assert!(res.known);
        assert_eq!(res.label, "Alice");
        assert_eq!(res.similarity, 100.0);
    }

    #[test]
    fn score_equal_to_threshold_stays_unknown() {
        let reg = registry(&[("AB1234", "Alice")]);
        // An exact match scores 100; a threshold of exactly 100 must not pass.
        let res = resolve("AB1234", Some(&reg), 100.0);
        assert!(!res.known);
        assert_eq!(res.label, "AB1234");
        assert_eq!(res.similarity, 100.0);
    }

    #[test]
    fn score_one_above_threshold_is_known() {
        let reg = registry(&[("AB1234", "Alice")]);
        let res = resolve("AB1234", Some(&reg), 99.0);
        assert!(res.known);
        assert_eq!(res.label, "Alice");
    }

    #[test]
    fn below_threshold_keeps_unnormalized_text() {
        let reg = registry(&[("AB1234", "Alice")]);
        let res = resolve("XY9999", Some(&reg), 90.0);
        assert!(!res.known);
        assert_eq!(res.label, "XY9999");
        assert!(res.similarity < 90.0);
    }

    #[test]
    fn confusables_fold_on_both_sides() {
        // Stored "OI1234" and read "0I1234" both fold to "011234".
        let reg = registry(&[("OI1234", "Olivia")]);
        let res = resolve("0I1234", Some(&reg), 90.0);
        assert!(res.known);
        assert_eq!(res.label, "Olivia");
        assert_eq!(res.similarity, 100.0);
    }

    #[test]
    fn fold_is_letter_to_digit() {
        assert_eq!(fold_confusables("OIZSGB"), "012568");
        assert_eq!(fold_confusables("AB1234"), "A81234");
    }
}
