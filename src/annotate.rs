use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::config::AnnotationStyle;
use crate::PlateResult;

const LABEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_TEXT: Rgb<u8> = Rgb([0, 0, 0]);

/// Draws detection boxes and identity labels onto frames in place.
pub struct FrameAnnotator {
    style: AnnotationStyle,
    font: Option<FontVec>,
}

impl FrameAnnotator {
    /// Loads the label font when the style names one. Boxes render without
    /// a font; labels require one, so a missing or unparseable font file
    /// degrades to boxes-only with a warning.
    pub fn new(style: AnnotationStyle) -> Self {
        let font = style.font_path.as_ref().and_then(|path| {
            let loaded = std::fs::read(path)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(anyhow::Error::from));
            match loaded {
                Ok(font) => Some(font),
                Err(err) => {
                    log::warn!(
                        "label font {} unavailable, drawing boxes only: {}",
                        path.display(),
                        err
                    );
                    None
                }
            }
        });
        Self { style, font }
    }

    /// Draw every result's box, and a label above it when that result's own
    /// label is non-empty.
    pub fn annotate(&self, frame: &mut RgbImage, results: &[PlateResult]) {
        for result in results {
            let color = if result.known {
                self.style.known_color
            } else {
                self.style.unknown_color
            };
            self.draw_box(frame, result.bbox, Rgb(color));

            if result.label.is_empty() {
                continue;
            }
            if let Some(font) = &self.font {
                self.draw_label(frame, result.bbox, &result.label, font);
            }
        }
    }

    fn draw_box(&self, frame: &mut RgbImage, bbox: [i32; 4], color: Rgb<u8>) {
        let [x1, y1, x2, y2] = bbox;
        let width = (x2 - x1) as i64;
        let height = (y2 - y1) as i64;
        for inset in 0..self.style.box_thickness as i64 {
            let w = width - 2 * inset;
            let h = height - 2 * inset;
            if w < 1 || h < 1 {
                break;
            }
            let ring = Rect::at(x1 + inset as i32, y1 + inset as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, ring, color);
        }
    }

    fn draw_label(&self, frame: &mut RgbImage, bbox: [i32; 4], label: &str, font: &FontVec) {
        let [x1, y1, _, _] = bbox;
        let scale = PxScale::from(self.style.text_scale);
        let (text_w, text_h) = text_size(scale, font, label);
        let rect = label_background(&self.style, x1, y1, text_w, text_h);
        draw_filled_rect_mut(frame, rect, LABEL_BACKGROUND);

        let padding = self.style.padding as i32;
        let text_x = x1 + padding / 2;
        let text_y = (y1 - padding / 2 - text_h as i32).max(0);
        for offset in 0..self.style.text_thickness as i32 {
            draw_text_mut(frame, LABEL_TEXT, text_x + offset, text_y, scale, font, label);
        }
    }
}

/// Filled background above the box's top-left corner, sized to the measured
/// text extent plus padding.
fn label_background(style: &AnnotationStyle, x1: i32, y1: i32, text_w: u32, text_h: u32) -> Rect {
    let padding = style.padding as i32;
    let top = (y1 - padding - text_h as i32).min(y1 - 1).max(0);
    let width = (padding + text_w as i32).max(1) as u32;
    let height = (y1 - top).max(1) as u32;
    Rect::at(x1, top).of_size(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnotationStyle;

    fn result(known: bool, label: &str) -> PlateResult {
        PlateResult {
            label: label.to_string(),
            license_plate: label.to_string(),
            known,
            detection_score: 0.9,
            ocr_score: 0.9,
            similarity_score: if known { 100.0 } else { 0.0 },
            bbox: [10, 10, 30, 20],
        }
    }

    #[test]
    fn known_and_unknown_boxes_use_their_colors() {
        let annotator = FrameAnnotator::new(AnnotationStyle::default());
        let mut frame = RgbImage::new(64, 64);

        annotator.annotate(&mut frame, &[result(true, "Alice")]);
        assert_eq!(*frame.get_pixel(10, 10), Rgb([0, 255, 0]));

        let mut frame = RgbImage::new(64, 64);
        annotator.annotate(&mut frame, &[result(false, "XY9999")]);
        assert_eq!(*frame.get_pixel(10, 10), Rgb([255, 0, 0]));
    }

    #[test]
    fn box_thickness_draws_inner_rings() {
        let annotator = FrameAnnotator::new(AnnotationStyle::default());
        let mut frame = RgbImage::new(64, 64);
        annotator.annotate(&mut frame, &[result(true, "Alice")]);
        // Default thickness 2: outer ring at x=10 plus an inset ring at x=11.
        assert_eq!(*frame.get_pixel(11, 15), Rgb([0, 255, 0]));
        assert_eq!(*frame.get_pixel(12, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_frame_box_is_clipped_not_fatal() {
        let annotator = FrameAnnotator::new(AnnotationStyle::default());
        let mut frame = RgbImage::new(32, 32);
        let mut clipped = result(false, "XY9999");
        clipped.bbox = [-5, -5, 60, 60];
        annotator.annotate(&mut frame, &[clipped]);
    }

    #[test]
    fn missing_font_file_degrades_to_boxes_only() {
        let style = AnnotationStyle {
            font_path: Some("/nonexistent/font.ttf".into()),
            ..AnnotationStyle::default()
        };
        let annotator = FrameAnnotator::new(style);
        let mut frame = RgbImage::new(64, 64);
        annotator.annotate(&mut frame, &[result(true, "Alice")]);
        // Box is drawn, label background is not.
        assert_eq!(*frame.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*frame.get_pixel(12, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn label_background_sits_above_the_box() {
        let style = AnnotationStyle::default();
        let rect = label_background(&style, 10, 50, 40, 12);
        assert_eq!(rect.left(), 10);
        assert_eq!(rect.top(), 50 - 20 - 12);
        assert_eq!(rect.width(), 60);
        assert_eq!(rect.height(), 32);
    }

    #[test]
    fn label_background_clamps_to_frame_top() {
        let style = AnnotationStyle::default();
        let rect = label_background(&style, 10, 5, 40, 12);
        assert_eq!(rect.top(), 0);
        assert_eq!(rect.height(), 5);
    }
}
