//! Pipeline orchestrator: the full engine cycle for one frame.
//!
//! # Processing steps per frame
//! 1. Cluster the frame's raw segments into left/right rail candidates
//! 2. Fold the candidates into the session's [`TrackState`] (smoothing)
//! 3. Classify the trajectory from the smoothed rails
//! 4. Estimate the distance of every detected object from its bottom row
//!
//! Frames of one session must be processed in order. Independent sessions
//! each own their `Pipeline` and can run in parallel.

use crate::{
    cluster::{ClusterDiagnostics, ClusterOutput, ClustererConfig, RailClusterer},
    distance::estimate_distance,
    error::{ConfigError, LoadError, Result},
    history::{validate_history_len, DEFAULT_HISTORY_LEN},
    track_state::{validate_reference_distance, TrackState, DEFAULT_REFERENCE_DISTANCE},
    trajectory::TrajectoryThresholds,
    types::{FrameBatch, LineModel, ObjectDetection, Trajectory},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Instant};
use tracing::debug;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for one engine session. Fixed for the session's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Smoothing window per rail, in frames
    pub history_len: usize,
    /// Real-world distance from the camera to the reference row
    pub reference_distance: f64,
    /// Reference row `y0`. `None` uses the bottom row of each frame.
    pub reference_row: Option<f64>,
    pub clusterer: ClustererConfig,
    pub thresholds: TrajectoryThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            reference_distance: DEFAULT_REFERENCE_DISTANCE,
            reference_row: None,
            clusterer: ClustererConfig::default(),
            thresholds: TrajectoryThresholds::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_history_len(self.history_len)?;
        validate_reference_distance(self.reference_distance)?;
        if let Some(row) = self.reference_row {
            if !row.is_finite() {
                return Err(ConfigError::ReferenceRow(row));
            }
        }
        self.clusterer.validate()?;
        self.thresholds.validate()
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> std::result::Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Distance estimate attached to one detected object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectEstimate {
    pub detection: ObjectDetection,
    /// `None` renders as "Unknown" in reports
    pub distance: Option<f64>,
}

/// Counters and timing for one frame.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FrameStats {
    pub segments: usize,
    pub degenerate: usize,
    pub discarded_clusters: usize,
    pub side_conflicts: usize,
    pub timing_cluster_us: u64,
    pub total_time_us: u64,
}

impl From<ClusterDiagnostics> for FrameStats {
    fn from(d: ClusterDiagnostics) -> Self {
        Self {
            segments: d.segments,
            degenerate: d.degenerate,
            discarded_clusters: d.discarded,
            side_conflicts: d.side_conflicts,
            ..Default::default()
        }
    }
}

/// Outputs of one pipeline step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameOutput {
    pub frame_index: u64,
    /// This frame's unsmoothed clustering result
    pub raw: ClusterOutput,
    /// Smoothed rails after this frame
    pub left: Option<LineModel>,
    pub right: Option<LineModel>,
    pub trajectory: Trajectory,
    /// Row used as `y0` for this frame's distances
    pub reference_row: f64,
    pub objects: Vec<ObjectEstimate>,
    pub stats: FrameStats,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The engine for one session: clusterer plus the session's track state.
pub struct Pipeline {
    pub config: PipelineConfig,
    pub state: TrackState,
    clusterer: RailClusterer,
}

impl Pipeline {
    /// Create a new pipeline, rejecting invalid configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let state = TrackState::with_thresholds(
            config.history_len,
            config.reference_distance,
            config.thresholds,
        )?;
        let clusterer = RailClusterer::new(config.clusterer.clone())?;
        Ok(Self {
            config,
            state,
            clusterer,
        })
    }

    /// Process one frame. Never fails: missing or degenerate data shows up
    /// as unset rails, `Trajectory::Unknown` and unknown distances.
    pub fn process_frame(&mut self, batch: &FrameBatch) -> FrameOutput {
        let start_total = Instant::now();

        // ----------------------------------------------------------------
        // Step 1: Cluster
        // ----------------------------------------------------------------
        let t0 = Instant::now();
        let (raw, diag) = self.clusterer.cluster_with_diagnostics(&batch.segments);
        let mut stats = FrameStats::from(diag);
        stats.timing_cluster_us = t0.elapsed().as_micros() as u64;

        // ----------------------------------------------------------------
        // Step 2-3: Smooth + classify
        // ----------------------------------------------------------------
        let trajectory = self.state.update(&raw);

        // ----------------------------------------------------------------
        // Step 4: Per-object distance
        // ----------------------------------------------------------------
        let reference_row = self
            .config
            .reference_row
            .unwrap_or(batch.frame_height as f64);
        let objects: Vec<ObjectEstimate> = batch
            .objects
            .iter()
            .map(|det| ObjectEstimate {
                distance: estimate_distance(&self.state, reference_row, det.bottom_row()),
                detection: det.clone(),
            })
            .collect();

        stats.total_time_us = start_total.elapsed().as_micros() as u64;
        debug!(
            frame = batch.frame_index,
            %trajectory,
            objects = objects.len(),
            unknown = objects.iter().filter(|o| o.distance.is_none()).count(),
            "frame processed"
        );

        FrameOutput {
            frame_index: batch.frame_index,
            raw,
            left: self.state.left(),
            right: self.state.right(),
            trajectory,
            reference_row,
            objects,
            stats,
        }
    }

    /// Start a new session with the same configuration.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
