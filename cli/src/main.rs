//! `railsight` CLI: scenario runs, replay of recorded detection logs, CSV reports.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rail_core::metrics::EstimationMetrics;
use rail_core::pipeline::{FrameOutput, Pipeline, PipelineConfig};
use rayon::prelude::*;
use sim::replay::{load_replay, save_replay, ReplayLog};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "railsight", about = "Rail track geometry and object distance estimation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a named scenario, run the engine over it and report.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Override the scenario's frame count
        #[arg(long)]
        frames: Option<u64>,
        #[command(flatten)]
        engine: EngineArgs,
        /// Write the per-object CSV report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Run the engine over one or more recorded logs.
    Replay {
        /// Paths to replay JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
        /// Directory for one CSV report per log
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Engine configuration shared by both subcommands.
#[derive(Args, Clone)]
struct EngineArgs {
    /// JSON pipeline configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Smoothing window per rail (frames)
    #[arg(long)]
    history_len: Option<usize>,
    /// Camera-to-reference-row distance (meters)
    #[arg(long)]
    reference_distance: Option<f64>,
}

impl EngineArgs {
    /// Config file (or defaults with the log's reference distance), then flags.
    fn resolve(&self, log_reference_distance: f64) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig {
                reference_distance: log_reference_distance,
                ..Default::default()
            },
        };
        if let Some(n) = self.history_len {
            config.history_len = n;
        }
        if let Some(d0) = self.reference_distance {
            config.reference_distance = d0;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            frames,
            engine,
            report,
            output,
            save_replay: save_path,
        } => {
            run_scenario(
                scenario,
                seed,
                frames,
                &engine,
                report.as_deref(),
                output.as_deref(),
                save_path.as_deref(),
            )?;
        }
        Commands::Replay {
            inputs,
            engine,
            report_dir,
            output,
        } => {
            run_replay(&inputs, &engine, report_dir.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Session processing
// ---------------------------------------------------------------------------

/// Result of running the engine over one log.
struct SessionRun {
    name: String,
    seed: u64,
    outputs: Vec<FrameOutput>,
    metrics: Option<EstimationMetrics>,
    elapsed_s: f64,
}

fn process_log(log: &ReplayLog, config: PipelineConfig) -> Result<SessionRun> {
    let mut pipeline = Pipeline::new(config)?;
    let has_truth = log.ground_truth.len() == log.frames.len();
    let mut metrics = EstimationMetrics::default();

    let start = Instant::now();
    let outputs: Vec<FrameOutput> = log
        .frames
        .iter()
        .enumerate()
        .map(|(i, batch)| {
            let out = pipeline.process_frame(batch);
            if has_truth {
                metrics.accumulate(&out, &log.ground_truth[i]);
            }
            out
        })
        .collect();

    Ok(SessionRun {
        name: log.scenario_name.clone(),
        seed: log.seed,
        outputs,
        metrics: has_truth.then_some(metrics),
        elapsed_s: start.elapsed().as_secs_f64(),
    })
}

fn print_summary(run: &SessionRun) {
    let objects: usize = run.outputs.iter().map(|o| o.objects.len()).sum();
    println!(
        "'{}': {} frames, {} objects, elapsed={:.3}s",
        run.name,
        run.outputs.len(),
        objects,
        run.elapsed_s,
    );
    if let Some(last) = run.outputs.last() {
        println!("Final trajectory: {}", last.trajectory);
    }
    if let Some(m) = &run.metrics {
        println!(
            "Distance: RMSE={:.3}m, mean rel. error={:.1}%, unknown={}/{}",
            m.rmse_distance(),
            m.mean_relative_error() * 100.0,
            m.n_unknown_distance,
            m.n_objects,
        );
        println!(
            "Trajectory accuracy={:.1}%, rail availability={:.1}%",
            m.trajectory_accuracy() * 100.0,
            m.rail_availability() * 100.0,
        );
    }
}

fn metrics_json(run: &SessionRun) -> serde_json::Value {
    let mut json = serde_json::json!({
        "scenario": run.name,
        "seed": run.seed,
        "frames": run.outputs.len(),
        "elapsed_s": run.elapsed_s,
        "final_trajectory": run.outputs.last().map(|o| o.trajectory.to_string()),
    });
    if let Some(m) = &run.metrics {
        json["metrics"] = serde_json::json!({
            "counts": m,
            "rmse_distance_m": m.rmse_distance(),
            "mean_relative_error": m.mean_relative_error(),
            "trajectory_accuracy": m.trajectory_accuracy(),
            "rail_availability": m.rail_availability(),
        });
    }
    json
}

// ---------------------------------------------------------------------------
// CSV report
// ---------------------------------------------------------------------------

const REPORT_HEADER: [&str; 10] = [
    "Frame",
    "Trajectory",
    "Class ID",
    "Object Name",
    "Confidence",
    "Distance",
    "X1",
    "Y1",
    "X2",
    "Y2",
];

/// One row per object; frames without objects get a row with the object
/// columns left empty so the trajectory of every frame is recorded.
fn write_report(path: &Path, outputs: &[FrameOutput]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating report {}", path.display()))?;
    wtr.write_record(REPORT_HEADER)?;

    for out in outputs {
        let frame = out.frame_index.to_string();
        let trajectory = out.trajectory.to_string();
        if out.objects.is_empty() {
            let mut row = vec![frame.clone(), trajectory.clone()];
            row.resize(REPORT_HEADER.len(), String::new());
            wtr.write_record(&row)?;
            continue;
        }
        for est in &out.objects {
            let det = &est.detection;
            let distance = match est.distance {
                Some(d) => format!("{d:.2}"),
                None => "Unknown".to_string(),
            };
            let [x1, y1, x2, y2] = det.bbox;
            wtr.write_record([
                frame.clone(),
                trajectory.clone(),
                det.class_id.to_string(),
                det.label.clone(),
                format!("{:.2}", det.confidence),
                distance,
                format!("{x1:.0}"),
                format!("{y1:.0}"),
                format!("{x2:.0}"),
                format!("{y2:.0}"),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    frames: Option<u64>,
    engine: &EngineArgs,
    report_path: Option<&Path>,
    output_path: Option<&Path>,
    replay_path: Option<&Path>,
) -> Result<()> {
    let mut scenario = Scenario::build(kind, seed);
    if let Some(n) = frames {
        scenario.frames = n;
    }

    println!(
        "Running scenario '{}' (seed={}, frames={})...",
        scenario.name, seed, scenario.frames
    );

    let log = ReplayLog::record(&scenario);
    let config = engine.resolve(log.reference_distance)?;
    info!(
        history_len = config.history_len,
        reference_distance = config.reference_distance,
        "engine configured"
    );

    let run = process_log(&log, config)?;
    print_summary(&run);

    if let Some(rpath) = report_path {
        write_report(rpath, &run.outputs)?;
        println!("Report saved to {}", rpath.display());
    }

    if let Some(rpath) = replay_path {
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output_path {
        std::fs::write(opath, serde_json::to_string_pretty(&metrics_json(&run))?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn run_replay(
    inputs: &[PathBuf],
    engine: &EngineArgs,
    report_dir: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = report_dir {
        std::fs::create_dir_all(dir)?;
    }

    // Sessions are independent: each log gets its own pipeline.
    let runs: Vec<SessionRun> = inputs
        .par_iter()
        .map(|input| -> Result<SessionRun> {
            let log = load_replay(input)
                .with_context(|| format!("loading replay {}", input.display()))?;
            info!(
                scenario = %log.scenario_name,
                frames = log.frames.len(),
                "replaying"
            );
            let run = process_log(&log, engine.resolve(log.reference_distance)?)?;
            if let Some(dir) = report_dir {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| run.name.clone());
                write_report(&dir.join(format!("{stem}.csv")), &run.outputs)?;
            }
            Ok(run)
        })
        .collect::<Result<_>>()?;

    for run in &runs {
        print_summary(run);
    }

    if let Some(opath) = output_path {
        let json: Vec<serde_json::Value> = runs.iter().map(metrics_json).collect();
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}
