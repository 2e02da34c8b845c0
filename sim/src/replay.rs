//! Replay: serialize/deserialize recorded detection logs for offline runs.
//!
//! A log is the engine's whole external input for one session (segments and
//! object boxes per frame) plus, when it came from the simulator, the
//! ground truth to score against.

use crate::scenarios::Scenario;
use rail_core::{metrics::GroundTruth, FrameBatch};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A full recorded session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    pub seed: u64,
    /// Camera-to-bottom-row distance the session should be configured with
    pub reference_distance: f64,
    /// Detector output in frame order
    pub frames: Vec<FrameBatch>,
    /// Per-frame truth, empty for real recordings
    #[serde(default)]
    pub ground_truth: Vec<GroundTruth>,
}

impl ReplayLog {
    /// Run the scenario's simulator over every frame and record the result.
    pub fn record(scenario: &Scenario) -> Self {
        let mut sim = scenario.simulator();
        let (frames, ground_truth) = (0..scenario.frames)
            .map(|i| sim.generate_frame(i, &scenario.track, &scenario.objects))
            .unzip();
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            reference_distance: scenario.reference_distance(),
            frames,
            ground_truth,
        }
    }
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)?;
    Ok(log)
}
