use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_EXPAND_X: u32 = 0;
const DEFAULT_EXPAND_Y: u32 = 0;
const DEFAULT_MIN_TEXT_AREA_FRACTION: f32 = 0.14;
const DEFAULT_SORTING_TOLERANCE: f32 = 0.33;
const DEFAULT_SIMILARITY_THRESHOLD: f64 = 90.0;
const DEFAULT_ATTENDANCE_INTERVAL_SECS: u64 = 300;

const DEFAULT_PADDING: u32 = 20;
const DEFAULT_TEXT_SCALE: f32 = 16.0;
const DEFAULT_TEXT_THICKNESS: u32 = 1;
const DEFAULT_BOX_THICKNESS: u32 = 2;
const DEFAULT_KNOWN_COLOR: [u8; 3] = [0, 255, 0];
const DEFAULT_UNKNOWN_COLOR: [u8; 3] = [255, 0, 0];

const DEFAULT_OCR_DECODER: &str = "beamsearch";
const DEFAULT_OCR_ALLOWLIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DEFAULT_OCR_BEAM_WIDTH: u32 = 8;
const DEFAULT_OCR_BATCH_SIZE: u32 = 64;
const DEFAULT_OCR_TEXT_THRESHOLD: f32 = 0.70;
const DEFAULT_OCR_LOW_TEXT: f32 = 0.40;
const DEFAULT_OCR_LINK_THRESHOLD: f32 = 0.40;

#[derive(Debug, Deserialize, Default)]
struct RecognitionConfigFile {
    model_dir: Option<String>,
    registry_path: Option<PathBuf>,
    require_registry: Option<bool>,
    expand_x: Option<u32>,
    expand_y: Option<u32>,
    min_text_area_fraction: Option<f32>,
    sorting_tolerance: Option<f32>,
    similarity_threshold: Option<f64>,
    attendance_interval_secs: Option<u64>,
    annotate: Option<bool>,
    annotation: Option<AnnotationStyleFile>,
    ocr: Option<OcrParamsFile>,
    sinks: Option<SinkPathsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnotationStyleFile {
    padding: Option<u32>,
    text_scale: Option<f32>,
    text_thickness: Option<u32>,
    known_color: Option<[u8; 3]>,
    unknown_color: Option<[u8; 3]>,
    box_thickness: Option<u32>,
    font_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct OcrParamsFile {
    decoder: Option<String>,
    allowlist: Option<String>,
    beam_width: Option<u32>,
    batch_size: Option<u32>,
    text_threshold: Option<f32>,
    low_text: Option<f32>,
    link_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SinkPathsFile {
    frame_path: Option<PathBuf>,
    results_path: Option<PathBuf>,
    attendance_path: Option<PathBuf>,
}

/// Immutable tunables for one pipeline instance.
///
/// Built once from file + environment, validated, then handed to the
/// pipeline at construction. Nothing in the core mutates it; a new
/// configuration means a new pipeline instance.
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Directory real detector/OCR backends load their weights from.
    pub model_dir: PathBuf,
    pub registry_path: Option<PathBuf>,
    /// When set, constructing a pipeline without a registry is fatal.
    pub require_registry: bool,
    /// Crop padding applied to each side of a detection box, in pixels.
    pub expand_x: u32,
    pub expand_y: u32,
    /// Fragments covering at most this fraction of the crop are discarded.
    pub min_text_area_fraction: f32,
    /// Row-bucketing coarseness for fragment ordering, in (0, 1].
    pub sorting_tolerance: f32,
    /// Matches must score strictly above this (0-100) to count as known.
    pub similarity_threshold: f64,
    /// Minimum gap between two reportable sightings of the same identity.
    pub attendance_interval: Duration,
    pub annotate: bool,
    pub annotation: AnnotationStyle,
    pub ocr: OcrParams,
    pub sinks: SinkPaths,
}

#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    /// Extra pixels around the label text inside its background rectangle.
    pub padding: u32,
    /// Label glyph height in pixels.
    pub text_scale: f32,
    pub text_thickness: u32,
    pub known_color: [u8; 3],
    pub unknown_color: [u8; 3],
    pub box_thickness: u32,
    /// TTF/OTF file for label rendering. Without it, boxes only.
    pub font_path: Option<PathBuf>,
}

/// Parameter set forwarded verbatim to the OCR engine on every call.
#[derive(Debug, Clone)]
pub struct OcrParams {
    pub decoder: String,
    pub allowlist: String,
    pub beam_width: u32,
    pub batch_size: u32,
    pub text_threshold: f32,
    pub low_text: f32,
    pub link_threshold: f32,
}

/// File paths the demo binary wires into `FileSink`s. Any of the three
/// streams may be left unconfigured.
#[derive(Debug, Clone, Default)]
pub struct SinkPaths {
    pub frame_path: Option<PathBuf>,
    pub results_path: Option<PathBuf>,
    pub attendance_path: Option<PathBuf>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            text_scale: DEFAULT_TEXT_SCALE,
            text_thickness: DEFAULT_TEXT_THICKNESS,
            known_color: DEFAULT_KNOWN_COLOR,
            unknown_color: DEFAULT_UNKNOWN_COLOR,
            box_thickness: DEFAULT_BOX_THICKNESS,
            font_path: None,
        }
    }
}

impl Default for OcrParams {
    fn default() -> Self {
        Self {
            decoder: DEFAULT_OCR_DECODER.to_string(),
            allowlist: DEFAULT_OCR_ALLOWLIST.to_string(),
            beam_width: DEFAULT_OCR_BEAM_WIDTH,
            batch_size: DEFAULT_OCR_BATCH_SIZE,
            text_threshold: DEFAULT_OCR_TEXT_THRESHOLD,
            low_text: DEFAULT_OCR_LOW_TEXT,
            link_threshold: DEFAULT_OCR_LINK_THRESHOLD,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            registry_path: None,
            require_registry: false,
            expand_x: DEFAULT_EXPAND_X,
            expand_y: DEFAULT_EXPAND_Y,
            min_text_area_fraction: DEFAULT_MIN_TEXT_AREA_FRACTION,
            sorting_tolerance: DEFAULT_SORTING_TOLERANCE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            attendance_interval: Duration::from_secs(DEFAULT_ATTENDANCE_INTERVAL_SECS),
            annotate: true,
            annotation: AnnotationStyle::default(),
            ocr: OcrParams::default(),
            sinks: SinkPaths::default(),
        }
    }
}

impl RecognitionConfig {
    /// Load from the JSON file named by `PLATEGATE_CONFIG` (if any), apply
    /// environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PLATEGATE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RecognitionConfigFile) -> Self {
        let defaults = Self::default();
        let annotation = file.annotation.unwrap_or_default();
        let ocr = file.ocr.unwrap_or_default();
        let sinks = file.sinks.unwrap_or_default();
        Self {
            model_dir: file
                .model_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            registry_path: file.registry_path,
            require_registry: file.require_registry.unwrap_or(false),
            expand_x: file.expand_x.unwrap_or(DEFAULT_EXPAND_X),
            expand_y: file.expand_y.unwrap_or(DEFAULT_EXPAND_Y),
            min_text_area_fraction: file
                .min_text_area_fraction
                .unwrap_or(DEFAULT_MIN_TEXT_AREA_FRACTION),
            sorting_tolerance: file.sorting_tolerance.unwrap_or(DEFAULT_SORTING_TOLERANCE),
            similarity_threshold: file
                .similarity_threshold
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            attendance_interval: Duration::from_secs(
                file.attendance_interval_secs
                    .unwrap_or(DEFAULT_ATTENDANCE_INTERVAL_SECS),
            ),
            annotate: file.annotate.unwrap_or(true),
            annotation: AnnotationStyle {
                padding: annotation.padding.unwrap_or(DEFAULT_PADDING),
                text_scale: annotation.text_scale.unwrap_or(DEFAULT_TEXT_SCALE),
                text_thickness: annotation.text_thickness.unwrap_or(DEFAULT_TEXT_THICKNESS),
                known_color: annotation.known_color.unwrap_or(DEFAULT_KNOWN_COLOR),
                unknown_color: annotation.unknown_color.unwrap_or(DEFAULT_UNKNOWN_COLOR),
                box_thickness: annotation.box_thickness.unwrap_or(DEFAULT_BOX_THICKNESS),
                font_path: annotation.font_path,
            },
            ocr: OcrParams {
                decoder: ocr.decoder.unwrap_or_else(|| DEFAULT_OCR_DECODER.to_string()),
                allowlist: ocr
                    .allowlist
                    .unwrap_or_else(|| DEFAULT_OCR_ALLOWLIST.to_string()),
                beam_width: ocr.beam_width.unwrap_or(DEFAULT_OCR_BEAM_WIDTH),
                batch_size: ocr.batch_size.unwrap_or(DEFAULT_OCR_BATCH_SIZE),
                text_threshold: ocr.text_threshold.unwrap_or(DEFAULT_OCR_TEXT_THRESHOLD),
                low_text: ocr.low_text.unwrap_or(DEFAULT_OCR_LOW_TEXT),
                link_threshold: ocr.link_threshold.unwrap_or(DEFAULT_OCR_LINK_THRESHOLD),
            },
            sinks: SinkPaths {
                frame_path: sinks.frame_path,
                results_path: sinks.results_path,
                attendance_path: sinks.attendance_path,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("PLATEGATE_REGISTRY") {
            if !path.trim().is_empty() {
                self.registry_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(threshold) = std::env::var("PLATEGATE_SIMILARITY") {
            self.similarity_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("PLATEGATE_SIMILARITY must be a number"))?;
        }
        if let Ok(interval) = std::env::var("PLATEGATE_ATTENDANCE_INTERVAL_SECS") {
            let seconds: u64 = interval.parse().map_err(|_| {
                anyhow!("PLATEGATE_ATTENDANCE_INTERVAL_SECS must be an integer number of seconds")
            })?;
            self.attendance_interval = Duration::from_secs(seconds);
        }
        if let Ok(annotate) = std::env::var("PLATEGATE_ANNOTATE") {
            self.annotate = match annotate.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => return Err(anyhow!("PLATEGATE_ANNOTATE must be a boolean, got '{other}'")),
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.sorting_tolerance > 0.0 && self.sorting_tolerance <= 1.0) {
            return Err(anyhow!(
                "sorting_tolerance must be in (0, 1], got {}",
                self.sorting_tolerance
            ));
        }
        if !(0.0..1.0).contains(&self.min_text_area_fraction) {
            return Err(anyhow!(
                "min_text_area_fraction must be in [0, 1), got {}",
                self.min_text_area_fraction
            ));
        }
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(anyhow!(
                "similarity_threshold must be in [0, 100], got {}",
                self.similarity_threshold
            ));
        }
        if self.attendance_interval.as_secs() == 0 {
            return Err(anyhow!("attendance_interval_secs must be greater than zero"));
        }
        if self.annotation.box_thickness == 0 || self.annotation.text_thickness == 0 {
            return Err(anyhow!("annotation thicknesses must be at least 1"));
        }
        if self.annotation.text_scale <= 0.0 {
            return Err(anyhow!("annotation text_scale must be positive"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<RecognitionConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
