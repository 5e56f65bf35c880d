use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use facegate_core::config::{ExtractorConfig, StrategyKind};
use facegate_core::detection::infrastructure::detector_factory::{
    create_extractor, ProgressFactory,
};
use facegate_core::extraction::face_extractor::FaceExtractor;
use facegate_core::pipeline::capture_face_use_case::{CaptureFaceUseCase, CaptureOutcome};
use facegate_core::pipeline::detect_face_use_case::DetectFaceUseCase;
use facegate_core::pipeline::detect_gesture_use_case::DetectGestureUseCase;
use facegate_core::shared::constants::IMAGE_EXTENSIONS;
use facegate_core::shared::model_resolver::ProgressFn;

/// Face detection, head-pose gestures and face capture for webcam frames.
#[derive(Parser)]
#[command(name = "facegate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the most confident face and print its box.
    Detect(InputArgs),
    /// Classify head pose as left, right or center.
    Pose(InputArgs),
    /// Crop the detected face into a fixed-size JPEG thumbnail.
    Capture {
        #[command(flatten)]
        input: InputArgs,

        /// Also write the JPEG thumbnail to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Standard,
    Enhanced,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Standard => StrategyKind::Standard,
            StrategyArg::Enhanced => StrategyKind::Enhanced,
        }
    }
}

#[derive(Args)]
struct InputArgs {
    /// Image file, or a text file holding a base64 payload.
    input: PathBuf,

    /// Treat the input as base64 text (optionally a data URI) even if it
    /// has an image extension.
    #[arg(long)]
    base64: bool,

    /// Detection strategy.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Enhanced strategy sensitivity (0.0-1.0).
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Standard strategy confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// BlazeFace ONNX model file.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face-mesh ONNX model file.
    #[arg(long)]
    landmark_model: Option<PathBuf>,

    /// JSON config file (defaults to the per-user config).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Detect(args) => {
            let payload = read_payload(&args)?;
            let extractor = build_extractor(&args)?;
            let report = DetectFaceUseCase::new(extractor).execute(&payload)?;
            print_json(&report)
        }
        Command::Pose(args) => {
            let payload = read_payload(&args)?;
            let extractor = build_extractor(&args)?;
            let report = DetectGestureUseCase::new(extractor).execute(&payload)?;
            print_json(&report)
        }
        Command::Capture { input, output } => {
            let payload = read_payload(&input)?;
            let extractor = build_extractor(&input)?;
            let outcome = CaptureFaceUseCase::new(extractor).execute(&payload)?;
            let Some(report) = outcome.report() else {
                return Err("No face detected".into());
            };
            if let (Some(path), CaptureOutcome::Captured { thumbnail, .. }) = (&output, &outcome) {
                fs::write(path, &thumbnail.data)?;
                log::info!("Thumbnail written to {}", path.display());
            }
            print_json(&report)
        }
    }
}

fn build_extractor(args: &InputArgs) -> Result<Arc<FaceExtractor>, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let progress: ProgressFactory<'_> = &|name| -> ProgressFn {
        let name = name.to_string();
        Box::new(move |downloaded, total| download_progress(&name, downloaded, total))
    };
    let extractor = create_extractor(&config, Some(progress))?;
    Ok(Arc::new(extractor))
}

/// Config file values with command-line overrides applied on top.
fn load_config(args: &InputArgs) -> Result<ExtractorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::load_default(),
    };

    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(sensitivity) = args.sensitivity {
        config.sensitivity = sensitivity;
    }
    if let Some(confidence) = args.confidence {
        config.min_confidence = confidence;
    }
    if let Some(path) = &args.detector_model {
        config.detector_path = Some(path.clone());
    }
    if let Some(path) = &args.landmark_model {
        config.landmark_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

/// The input as a base64 payload, encoding raw image files on the way.
fn read_payload(args: &InputArgs) -> Result<String, Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }
    if args.base64 || !is_image(&args.input) {
        return Ok(fs::read_to_string(&args.input)?);
    }
    Ok(STANDARD.encode(fs::read(&args.input)?))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
