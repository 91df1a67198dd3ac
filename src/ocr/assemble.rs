use super::TextFragment;

/// Assemble the OCR fragments of one crop into a single reading-order
/// string with an aggregate confidence.
///
/// Fragments whose area is at most `min_text_area_fraction` of the crop are
/// dropped as stray non-text detections. Survivors are bucketed into coarse
/// rows by vertical position normalized against the crop height, then
/// ordered left-to-right within a row, so plates with stacked text lines
/// concatenate top line first.
///
/// Returns `("", 0.0)` when no fragment survives.
pub fn assemble(
    fragments: &[TextFragment],
    crop_w: u32,
    crop_h: u32,
    min_text_area_fraction: f32,
    sorting_tolerance: f32,
) -> (String, f32) {
    let crop_area = crop_w as f32 * crop_h as f32;
    if crop_area <= 0.0 {
        return (String::new(), 0.0);
    }

    let mut kept: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| f.area() / crop_area > min_text_area_fraction)
        .collect();
    if kept.is_empty() {
        return (String::new(), 0.0);
    }

    kept.sort_by(|a, b| {
        let (row_a, x_a) = sort_key(a, crop_h, sorting_tolerance);
        let (row_b, x_b) = sort_key(b, crop_h, sorting_tolerance);
        row_a.cmp(&row_b).then(x_a.total_cmp(&x_b))
    });

    let text: String = kept.iter().map(|f| f.text.to_uppercase()).collect();
    let score = kept.iter().map(|f| f.confidence).sum::<f32>() / kept.len() as f32;
    (text, score)
}

fn sort_key(fragment: &TextFragment, crop_h: u32, tolerance: f32) -> (i64, f32) {
    let (x, y) = fragment.top_left();
    let row = (y / crop_h as f32 / tolerance).floor() as i64;
    (row, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(quad: [(f32, f32); 4], text: &str, confidence: f32) -> TextFragment {
        TextFragment {
            quad,
            text: text.to_string(),
            confidence,
        }
    }

    fn wide(x: f32, y: f32, text: &str, confidence: f32) -> TextFragment {
        // 60x30 box: 1800 of a 100x100 crop, comfortably above a 0.14 cut.
        fragment(
            [(x, y), (x + 60.0, y), (x + 60.0, y + 30.0), (x, y + 30.0)],
            text,
            confidence,
        )
    }

    #[test]
    fn no_fragments_yields_empty() {
        assert_eq!(assemble(&[], 100, 100, 0.14, 0.33), (String::new(), 0.0));
    }

    #[test]
    fn all_below_area_threshold_yields_empty() {
        let tiny = fragment([(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)], "X", 0.9);
        let (text, score) = assemble(&[tiny], 100, 100, 0.14, 0.33);
        assert_eq!(text, "");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn rows_order_before_columns() {
        // tolerance 0.5, crop height 100: y=10 lands in row 0, y=60 in row 1.
        // B sits left of A horizontally but must still come second.
        let a = wide(90.0, 10.0, "ab", 0.8);
        let b = wide(0.0, 60.0, "12", 0.6);
        let (text, score) = assemble(&[b.clone(), a.clone()], 200, 100, 0.05, 0.5);
        assert_eq!(text, "AB12");
        assert!((score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn same_row_orders_left_to_right() {
        let left = wide(5.0, 10.0, "AB", 0.9);
        let right = wide(80.0, 12.0, "12", 0.9);
        let (text, _) = assemble(&[right, left], 200, 100, 0.05, 0.5);
        assert_eq!(text, "AB12");
    }

    #[test]
    fn text_is_uppercased_and_score_averaged() {
        let one = wide(0.0, 0.0, "ab", 0.6);
        let two = wide(70.0, 0.0, "cd", 1.0);
        let (text, score) = assemble(&[one, two], 200, 100, 0.05, 0.33);
        assert_eq!(text, "ABCD");
        assert!((score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn filtered_fragment_excluded_from_score() {
        let big = wide(0.0, 0.0, "AB", 0.8);
        let tiny = fragment([(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)], "zz", 0.1);
        let (text, score) = assemble(&[big, tiny], 200, 100, 0.05, 0.33);
        assert_eq!(text, "AB");
        assert!((score - 0.8).abs() < 1e-6);
    }
}
