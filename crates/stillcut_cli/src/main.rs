//! stillcut - Main entry point
//!
//! Handles:
//! - Configuration loading and command line overrides
//! - Application-level logging initialization
//! - One run through the session, then export and summary

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use stillcut_core::config::{ConfigManager, ConfigSection};
use stillcut_core::engine::{EngineAssets, FfmpegEngine};
use stillcut_core::logging::{init_tracing, init_tracing_with_file, LogLevel};
use stillcut_core::orchestrator::{RunReport, Session};

/// Cut long static stretches out of a video.
#[derive(Parser, Debug)]
#[command(name = "stillcut", version, about, long_about = None)]
#[command(group = clap::ArgGroup::new("overrides").args(["threshold", "ffmpeg"]).multiple(true))]
struct Args {
    /// Source video (.mp4)
    input: Option<PathBuf>,

    /// Config file, created with defaults if missing
    #[arg(short, long, default_value = ".config/stillcut.toml")]
    config: PathBuf,

    /// Copy the processed video here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only cut static spans longer than this many seconds
    #[arg(short, long)]
    threshold: Option<f64>,

    /// ffmpeg executable to use
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Write engine output to the run log and enable debug tracing
    #[arg(short, long)]
    verbose: bool,

    /// Store --threshold and --ffmpeg in the config file
    #[arg(long, requires = "overrides")]
    save: bool,
}

impl Args {
    /// Config sections touched by command line overrides.
    fn overridden_sections(&self) -> Vec<ConfigSection> {
        let mut sections = Vec::new();
        if self.threshold.is_some() {
            sections.push(ConfigSection::Excision);
        }
        if self.ffmpeg.is_some() {
            sections.push(ConfigSection::Engine);
        }
        sections
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigManager::new(&args.config);
    config
        .load_or_create()
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let settings = config.settings_mut();
    if let Some(threshold) = args.threshold {
        settings.excision.duration_threshold_secs = threshold;
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        settings.engine.ffmpeg_path = ffmpeg.to_string_lossy().to_string();
    }
    if args.verbose {
        settings.logging.compact = false;
    }
    let problems = settings.validate();
    if !problems.is_empty() {
        bail!("invalid settings: {}", problems.join("; "));
    }

    if args.save {
        for section in args.overridden_sections() {
            config
                .update_section(section)
                .with_context(|| format!("saving [{}]", section.table_name()))?;
        }
    }

    config
        .ensure_dirs_exist()
        .context("creating output, temp and log directories")?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let _log_guard = match init_tracing_with_file(level, config.logs_folder()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            init_tracing(level);
            tracing::warn!("File logging unavailable, logging to stderr only: {}", e);
            None
        }
    };

    tracing::info!("stillcut {} starting", stillcut_core::version());
    tracing::info!("Config: {}", config.path().display());

    let settings = config.settings().clone();
    let scratch = PathBuf::from(&settings.paths.temp_root).join("engine");
    let assets = EngineAssets::native(&settings.engine.ffmpeg_path);
    let quiet = args.json;

    let mut session = Session::new(FfmpegEngine::new(scratch), assets, settings)
        .with_progress_callback(Box::new(move |step, percent, message| {
            if !quiet {
                eprintln!("[{}] {:>3}% {}", step, percent, message);
            }
        }));

    let report = session.submit(args.input.as_deref()).map_err(|e| {
        tracing::error!("{:?}: {}", e.kind(), e);
        e
    })?;

    if let Some(dest) = &args.output {
        session
            .store()
            .export(&report.artifact, dest)
            .with_context(|| format!("exporting to {}", dest.display()))?;
        // The exported copy replaces the published one
        if let Err(e) = session.release_artifact() {
            tracing::warn!("Could not remove {}: {}", report.artifact.path.display(), e);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, args.output.as_ref());
    }

    Ok(())
}

fn print_summary(report: &RunReport, exported: Option<&PathBuf>) {
    println!(
        "Removed {:.1}s in {} interval(s); {:.1}s of static video found in total",
        report.excised_secs,
        report.intervals.len(),
        report.total_dropped_secs
    );
    for interval in &report.intervals {
        println!("  {:.1}s -> {:.1}s", interval.start, interval.end);
    }
    println!("Output: {}", exported.unwrap_or(&report.artifact.path).display());
    println!("Log: {}", report.log_path.display());
}
