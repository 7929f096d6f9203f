use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use trafficlens_core::analytics::domain::analysis_results::{AnalysisKind, AnalysisResults};
use trafficlens_core::analytics::domain::collision_risk_detector::SafetySummary;
use trafficlens_core::analytics::domain::speed_estimator::SpeedStats;
use trafficlens_core::pipeline::analytics_executor::{
    AnalyticsExecutor, SequentialAnalyticsExecutor,
};
use trafficlens_core::pipeline::analyze_video_use_case::AnalyzeVideoUseCase;
use trafficlens_core::pipeline::infrastructure::threaded_analytics_executor::ThreadedAnalyticsExecutor;
use trafficlens_core::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, StdoutPipelineLogger,
};
use trafficlens_core::pipeline::smooth_detections_use_case::SmoothDetectionsUseCase;
use trafficlens_core::smoothing::domain::smoothing_config::{create_smoother, SmoothingConfig};
use trafficlens_core::storage::domain::analytics_store::AnalyticsStore;
use trafficlens_core::storage::infrastructure::json_file_store::{
    load_document, save_document, JsonFileStore,
};

/// Traffic analytics over stored object tracks.
#[derive(Parser)]
#[command(name = "trafficlens")]
struct Cli {
    /// Video document (JSON) holding detections and scene geometry.
    document: PathBuf,

    /// Write the updated document here instead of in place.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Analyses to run (comma-separated): line-counts, lane-events,
    /// near-misses, speeds. Default: all the scene has geometry for.
    #[arg(long, value_delimiter = ',')]
    analyses: Option<Vec<AnalysisKind>>,

    /// Run analyses on parallel threads.
    #[arg(long)]
    threaded: bool,

    /// Override the stored frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Frames a lane must be held before a lane change counts.
    #[arg(long)]
    min_frames_in_zone: Option<usize>,

    /// Also write a copy with temporally smoothed boxes to this path.
    #[arg(long)]
    smooth: Option<PathBuf>,

    /// Smoothing factor (0.0-1.0, higher follows detections more closely).
    #[arg(long, default_value = "0.7")]
    alpha: f64,

    /// Derive the smoothing factor from per-track motion.
    #[arg(long)]
    adaptive: bool,

    /// Print timing, safety and speed summaries.
    #[arg(long)]
    summary: bool,
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

    let target = prepare_target(&cli.document, cli.output.as_deref())?;
    let store = JsonFileStore::new();
    let video_id = store.add_document(&target)?;

    let mut config = store.load_config(video_id)?;
    if let Some(n) = cli.min_frames_in_zone {
        config.min_frames_in_zone = n;
    }

    let executor: Box<dyn AnalyticsExecutor> = if cli.threaded {
        Box::new(ThreadedAnalyticsExecutor::new())
    } else {
        Box::new(SequentialAnalyticsExecutor::new())
    };
    let logger: Box<dyn PipelineLogger> = if cli.summary {
        Box::new(StdoutPipelineLogger::new())
    } else {
        Box::new(NullPipelineLogger)
    };

    let mut use_case = AnalyzeVideoUseCase::new(&store, executor, logger).with_config(config);
    if let Some(fps) = cli.fps {
        use_case = use_case.with_fps(fps);
    }
    let results = use_case.execute(video_id, cli.analyses.as_deref())?;
    print_results(&results);
    log::info!("Results written to {}", target.display());

    if cli.summary {
        use_case.logger().summary();
        print_summaries(&results);
    }

    if let Some(smooth_path) = &cli.smooth {
        run_smoothing(&target, smooth_path, &cli)?;
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.document.exists() {
        return Err(format!("Document not found: {}", cli.document.display()).into());
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err("--fps must be a positive number".into());
        }
    }
    if cli.min_frames_in_zone == Some(0) {
        return Err("--min-frames-in-zone must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.alpha) {
        return Err("--alpha must be between 0.0 and 1.0".into());
    }
    if cli.adaptive && cli.smooth.is_none() {
        return Err("--adaptive requires --smooth".into());
    }
    Ok(())
}

/// The document the pass writes to: the input itself, or a fresh copy at
/// `output`.
fn prepare_target(
    document: &Path,
    output: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match output {
        Some(output) => {
            save_document(output, &load_document(document)?)?;
            Ok(output.to_path_buf())
        }
        None => Ok(document.to_path_buf()),
    }
}

fn run_smoothing(
    source: &Path,
    destination: &Path,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SmoothingConfig {
        alpha: cli.alpha,
        adaptive: cli.adaptive,
        ..Default::default()
    };
    let mut document = load_document(source)?;
    let mut use_case = SmoothDetectionsUseCase::new(create_smoother(&config));
    document.detections = use_case.execute(&document.detections);
    save_document(destination, &document)?;
    log::info!("Smoothed boxes written to {}", destination.display());
    Ok(())
}

fn print_results(results: &AnalysisResults) {
    if let Some(tallies) = &results.line_counts {
        for (line_id, tally) in tallies {
            println!(
                "line {line_id}: in={} out={}",
                tally.inbound, tally.outbound
            );
        }
    }
    for kind in results.kinds() {
        println!("{kind}: {}", results.count(kind));
    }
}

fn print_summaries(results: &AnalysisResults) {
    if let Some(events) = &results.near_misses {
        let safety = SafetySummary::from_events(events);
        println!(
            "near misses: {} detected, {} critical",
            safety.events_detected, safety.critical_events
        );
    }
    if let Some(speeds) = &results.speeds {
        let stats = SpeedStats::from_track_speeds(speeds);
        println!(
            "speeds: {} samples, avg {:.1} km/h, max {:.1} km/h, min {:.1} km/h",
            stats.count, stats.avg, stats.max, stats.min
        );
    }
}
