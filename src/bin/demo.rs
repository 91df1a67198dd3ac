//! demo - synthetic end-to-end run of the plate recognition stage
//!
//! Feeds scripted detections and OCR fragments through a real pipeline
//! wired to file sinks, so the full frame -> results -> attendance path can
//! be exercised without models or cameras.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};

use plategate::{
    DetectionBox, FileSink, OutputRouter, PlateRegistry, RecognitionConfig, RecognitionPipeline,
    StubDetector, StubOcr, TextFragment,
};

const FRAME_WIDTH: u32 = 320;
const FRAME_HEIGHT: u32 = 240;
const PLATE_BOX: DetectionBox = DetectionBox {
    x1: 100,
    y1: 80,
    x2: 220,
    y2: 120,
    confidence: 0.87,
    class_id: 0,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of synthetic frames to process.
    #[arg(long, default_value_t = 3)]
    frames: u32,
    /// Output directory for sink files and the demo registry.
    #[arg(long, default_value = "demo_out")]
    out: String,
    /// Optional JSON config file (overrides PLATEGATE_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(path) = &args.config {
        std::env::set_var("PLATEGATE_CONFIG", path);
    }
    let mut config = RecognitionConfig::load()?;

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    stage("load plate registry");
    let registry_path = match &config.registry_path {
        Some(path) => path.clone(),
        None => {
            let path = out_dir.join("registry.json");
            fs::write(&path, r#"{"AB1234": "Alice", "CD5678": "Carol"}"#)
                .with_context(|| format!("failed to write demo registry {}", path.display()))?;
            path
        }
    };
    let registry = PlateRegistry::load(&registry_path)?;

    stage("wire pipeline with stub backends");
    let frame_path = config
        .sinks
        .frame_path
        .take()
        .unwrap_or_else(|| out_dir.join("frames.mjpeg"));
    let results_path = config
        .sinks
        .results_path
        .take()
        .unwrap_or_else(|| out_dir.join("results.jsonl"));
    let attendance_path = config
        .sinks
        .attendance_path
        .take()
        .unwrap_or_else(|| out_dir.join("attendance.jsonl"));
    let router = OutputRouter::new()
        .with_frame_sink(Box::new(FileSink::new(&frame_path)))
        .with_results_sink(Box::new(FileSink::new(&results_path)))
        .with_attendance_sink(Box::new(FileSink::new(&attendance_path)));

    // Two frames sight the same plate (the second deduplicates), the rest
    // are empty road.
    let detector = StubDetector::with_script(vec![vec![PLATE_BOX], vec![PLATE_BOX]]);
    let ocr = StubOcr::with_script(vec![vec![plate_fragment()], vec![plate_fragment()]]);

    let mut pipeline = RecognitionPipeline::new(
        config,
        Box::new(detector),
        Box::new(ocr),
        Some(registry),
        router,
    )?;

    stage("process synthetic frames");
    pipeline.start()?;
    for index in 0..args.frames {
        let mut frame = synthetic_frame(index);
        pipeline.process(&mut frame)?;
    }
    pipeline.stop();

    println!("demo summary:");
    println!("  frames processed: {}", args.frames);
    println!("  registry: {}", registry_path.display());
    println!("  frame sink: {}", frame_path.display());
    println!("  results sink: {}", results_path.display());
    println!("  attendance sink: {}", attendance_path.display());
    println!("next steps:");
    println!("  tail {}", results_path.display());
    println!("  tail {}", attendance_path.display());
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

/// One fragment covering most of the 120x40 crop the demo box produces.
fn plate_fragment() -> TextFragment {
    TextFragment {
        quad: [(4.0, 4.0), (116.0, 4.0), (116.0, 36.0), (4.0, 36.0)],
        text: "AB1234".to_string(),
        confidence: 0.92,
    }
}

/// Dark road with a light plate-colored rectangle where the demo box sits.
fn synthetic_frame(index: u32) -> RgbImage {
    let shade = 32 + (index % 8) as u8 * 4;
    let mut frame = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([shade, shade, shade]));
    for y in PLATE_BOX.y1..PLATE_BOX.y2 {
        for x in PLATE_BOX.x1..PLATE_BOX.x2 {
            frame.put_pixel(x as u32, y as u32, Rgb([210, 210, 200]));
        }
    }
    frame
}
