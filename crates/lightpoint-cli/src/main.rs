use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lightpoint_core::{classify_frame, BoundingBox, DetectionConfig, MaskRegistry, RedCountMonitor};
use lightpoint_io::{
    load_frame, load_stencil, open_first_available, FrameSource, ImageSequenceSource, SourceError,
    SourceFactory, StillImageSource,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "lightpoint", about = "Mask-guided red light-point diagnostics")]
struct Cli {
    /// Threshold profile (overrides LIGHTPOINT_PROFILE)
    #[arg(long, global = true)]
    profile: Option<String>,
    /// TOML threshold file (overrides LIGHTPOINT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the light-point regions of a mask
    Regions {
        #[arg(short, long)]
        mask: PathBuf,
        /// Target width (defaults to the mask's own width)
        #[arg(long, requires = "height")]
        width: Option<u32>,
        /// Target height (defaults to the mask's own height)
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
    /// Classify every region of one frame
    Classify {
        #[arg(short, long)]
        mask: PathBuf,
        #[arg(short, long)]
        frame: PathBuf,
    },
    /// Baseline on the first frame, then report red-count changes
    Watch {
        #[arg(short, long)]
        mask: PathBuf,
        /// Directory of frames, or a single image to replay
        #[arg(short, long)]
        frames: PathBuf,
        /// Simulated capture interval between frames
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Replay count when `frames` is a single image
        #[arg(long, default_value_t = 50)]
        repeat: usize,
    },
    /// Print a threshold profile as TOML
    Profile {
        #[arg(default_value = "default")]
        name: String,
    },
}

#[derive(Serialize)]
struct RegionSummary {
    id: usize,
    area: usize,
    bounds: BoundingBox,
    centroid: (f32, f32),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    if let Some(path) = cli.config {
        config.config_path = Some(path);
    }

    match cli.command {
        Commands::Regions { mask, width, height } => {
            let detection = config.detection()?;
            let stencil = load_stencil(&mask)?;
            let (w, h) = match (width, height) {
                (Some(w), Some(h)) => (w, h),
                _ => stencil.dimensions(),
            };
            let registry = MaskRegistry::new(stencil, w, h, detection.extractor)
                .with_context(|| format!("extracting regions from {}", mask.display()))?;
            let summaries: Vec<RegionSummary> = registry
                .regions()
                .iter()
                .map(|r| RegionSummary {
                    id: r.id,
                    area: r.area,
                    bounds: r.bounds,
                    centroid: r.centroid,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Classify { mask, frame } => {
            let detection = config.detection()?;
            let frame = load_frame(&frame)?;
            let registry = MaskRegistry::new(load_stencil(&mask)?, frame.width, frame.height, detection.extractor)
                .with_context(|| format!("extracting regions from {}", mask.display()))?;
            let report = classify_frame(&frame, registry.regions(), &detection);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "width": frame.width,
                    "height": frame.height,
                    "regions": registry.regions().len(),
                    "red_count": report.red_count(),
                    "red_ids": report.red_ids(),
                    "report": report,
                }))?
            );
        }
        Commands::Watch {
            mask,
            frames,
            interval_ms,
            repeat,
        } => {
            let detection = config.detection()?;
            run_watch(&config, &detection, mask, frames, Duration::from_millis(interval_ms), repeat)?;
        }
        Commands::Profile { name } => {
            let profile = DetectionConfig::profile(&name).with_context(|| {
                format!("unknown profile '{name}' (expected one of {:?})", DetectionConfig::PROFILES)
            })?;
            print!("{}", toml::to_string_pretty(&profile)?);
        }
    }

    Ok(())
}

fn sequence_source(dir: PathBuf) -> SourceFactory {
    Box::new(move || -> Result<Box<dyn FrameSource>, SourceError> {
        Ok(Box::new(ImageSequenceSource::open(dir)?))
    })
}

fn still_source(path: PathBuf, repeat: usize) -> SourceFactory {
    Box::new(move || -> Result<Box<dyn FrameSource>, SourceError> {
        Ok(Box::new(StillImageSource::open(path, Some(repeat))?))
    })
}

fn run_watch(
    config: &Config,
    detection: &DetectionConfig,
    mask: PathBuf,
    frames: PathBuf,
    interval: Duration,
    repeat: usize,
) -> Result<()> {
    let candidates = vec![sequence_source(frames.clone()), still_source(frames, repeat)];
    let (mut source, first) = open_first_available(candidates)?;

    let mut registry = MaskRegistry::new(load_stencil(&mask)?, first.width, first.height, detection.extractor)
        .with_context(|| format!("extracting regions from {}", mask.display()))?;

    let start = Instant::now();
    let mut monitor = RedCountMonitor::new(config.stable_period);
    let baseline = classify_frame(&first, registry.regions(), detection);
    monitor.set_baseline(baseline.red_count(), start);
    println!(
        "{}",
        serde_json::json!({ "event": "baseline", "red_count": baseline.red_count(), "regions": registry.regions().len() })
    );

    let mut index = 0u32;
    while let Some(frame) = source.next_frame()? {
        index += 1;
        let now = start + interval * index;

        registry.align_to(frame.width, frame.height)?;
        let report = classify_frame(&frame, registry.regions(), detection);
        if !report.is_complete() {
            tracing::warn!(frame = index, failed = report.failures.len(), "partial frame result");
        }
        if let Some(change) = monitor.observe(report.red_count(), now) {
            println!(
                "{}",
                serde_json::json!({ "event": "change", "frame": index, "change": change, "red_ids": report.red_ids() })
            );
        }
    }

    tracing::info!(frames = index + 1, source = source.name(), "watch finished");
    Ok(())
}
