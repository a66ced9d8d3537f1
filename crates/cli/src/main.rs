use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use streamveil_core::blurring::infrastructure::gaussian_region_blurrer::GaussianRegionBlurrer;
use streamveil_core::detection::infrastructure::haar_cascade_detector::HaarCascadeDetector;
use streamveil_core::detection::infrastructure::model_resolver;
use streamveil_core::pipeline::pipeline_logger::LogPipelineLogger;
use streamveil_core::pipeline::redact_stream_use_case::RedactStreamUseCase;
use streamveil_core::shared::constants::{
    BLUR_KERNEL_SIZE, CASCADE_MIN_NEIGHBORS, CASCADE_MODEL_NAME, CASCADE_MODEL_URL,
    CASCADE_SCALE_FACTOR,
};
use streamveil_core::video::infrastructure::encoder_process_sink::EncoderProcessSink;
use streamveil_core::video::infrastructure::ffmpeg_source::FfmpegSource;

/// Real-time face redaction for live video streams.
///
/// Reads a live stream, blurs every detected face, and republishes the
/// redacted stream through an external encoder.
#[derive(Parser)]
#[command(name = "streamveil")]
struct Cli {
    /// Input stream URL (e.g. rtsp://camera/live).
    #[arg(env = "INPUT_STREAM")]
    input: String,

    /// Output stream URL to publish to.
    #[arg(env = "OUTPUT_STREAM")]
    output: String,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long, default_value_t = BLUR_KERNEL_SIZE)]
    blur_strength: usize,

    /// Detection scale pyramid factor (> 1.0).
    #[arg(long, default_value_t = CASCADE_SCALE_FACTOR)]
    scale_factor: f64,

    /// Overlapping detections required to confirm a face.
    #[arg(long, default_value_t = CASCADE_MIN_NEIGHBORS)]
    min_neighbors: usize,

    /// Path to a cascade model file (skips the cache/download lookup).
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Encoder program fed raw frames on stdin.
    #[arg(long, default_value = "ffmpeg")]
    encoder: String,

    /// Longest tolerated source stall before giving up, in seconds.
    #[arg(long, default_value_t = 30)]
    max_stall_secs: u64,
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
    validate(&cli)?;

    let cascade_path = match &cli.cascade {
        Some(path) => path.clone(),
        None => model_resolver::resolve(CASCADE_MODEL_NAME, CASCADE_MODEL_URL, None)?,
    };
    let detector =
        HaarCascadeDetector::from_file(&cascade_path, cli.scale_factor, cli.min_neighbors)?;

    let mut pipeline = RedactStreamUseCase::new(
        Box::new(FfmpegSource::new()),
        Box::new(detector),
        Box::new(GaussianRegionBlurrer::new(cli.blur_strength)),
        Box::new(EncoderProcessSink::new(cli.encoder.clone())),
        Box::new(LogPipelineLogger::default()),
        Some(Duration::from_secs(cli.max_stall_secs)),
    );

    let summary = pipeline.run(&cli.input, &cli.output)?;
    log::info!(
        "done: {} frames forwarded, {} redacted",
        summary.frames_forwarded,
        summary.frames_redacted
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), String> {
    if cli.blur_strength % 2 == 0 {
        return Err(format!(
            "--blur-strength must be odd, got {}",
            cli.blur_strength
        ));
    }
    if cli.scale_factor <= 1.0 {
        return Err(format!(
            "--scale-factor must be greater than 1.0, got {}",
            cli.scale_factor
        ));
    }
    if cli.max_stall_secs == 0 {
        return Err("--max-stall-secs must be positive".to_string());
    }
    Ok(())
}
