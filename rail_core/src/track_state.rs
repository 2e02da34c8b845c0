//! Per-session rail state: smoothed models, their histories, last trajectory.
//!
//! One `TrackState` per video/stream session. It is mutated once per frame,
//! in frame order, and never shared between sessions. All writes go through
//! [`TrackState::update`], which drives the temporal smoother.

use crate::{
    cluster::ClusterOutput,
    distance,
    error::{ConfigError, Result},
    history::ModelHistory,
    smoother::TemporalSmoother,
    trajectory::{self, TrajectoryThresholds},
    types::{LineModel, RailSide, Trajectory},
};
use tracing::debug;

/// Default real-world distance from the camera to the frame's bottom row.
pub const DEFAULT_REFERENCE_DISTANCE: f64 = 9.5;

#[derive(Clone, Debug)]
pub struct TrackState {
    reference_distance: f64,
    thresholds: TrajectoryThresholds,
    smoother: TemporalSmoother,
    left: Option<LineModel>,
    right: Option<LineModel>,
    trajectory: Trajectory,
    frames: u64,
}

impl Default for TrackState {
    fn default() -> Self {
        Self::build(
            TemporalSmoother::default(),
            DEFAULT_REFERENCE_DISTANCE,
            TrajectoryThresholds::default(),
        )
    }
}

impl TrackState {
    /// Create a session state with a smoothing window of `history_len`
    /// frames and reference distance `d0`.
    pub fn new(history_len: usize, reference_distance: f64) -> Result<Self> {
        Self::with_thresholds(history_len, reference_distance, TrajectoryThresholds::default())
    }

    pub fn with_thresholds(
        history_len: usize,
        reference_distance: f64,
        thresholds: TrajectoryThresholds,
    ) -> Result<Self> {
        let smoother = TemporalSmoother::new(history_len)?;
        validate_reference_distance(reference_distance)?;
        thresholds.validate()?;
        Ok(Self::build(smoother, reference_distance, thresholds))
    }

    fn build(
        smoother: TemporalSmoother,
        reference_distance: f64,
        thresholds: TrajectoryThresholds,
    ) -> Self {
        Self {
            reference_distance,
            thresholds,
            smoother,
            left: None,
            right: None,
            trajectory: Trajectory::Unknown,
            frames: 0,
        }
    }

    /// Fold one frame's raw cluster result into the state.
    ///
    /// Both sides are smoothed even when `raw` is empty, so earlier estimates
    /// carry through frames with no detection. The trajectory is reclassified
    /// from the new smoothed rails.
    pub fn update(&mut self, raw: &ClusterOutput) -> Trajectory {
        let (left, right) = self.smoother.update_frame(raw);
        self.left = left;
        self.right = right;
        self.trajectory = trajectory::classify(self);
        self.frames += 1;
        debug!(
            frame = self.frames,
            left = ?self.left,
            right = ?self.right,
            trajectory = %self.trajectory,
            "track state updated"
        );
        self.trajectory
    }

    /// Smoothed left rail, `None` until a left rail has ever been seen.
    pub fn left(&self) -> Option<LineModel> {
        self.left
    }

    /// Smoothed right rail, `None` until a right rail has ever been seen.
    pub fn right(&self) -> Option<LineModel> {
        self.right
    }

    /// Classification made at the last update.
    pub fn trajectory(&self) -> Trajectory {
        self.trajectory
    }

    pub fn history(&self, side: RailSide) -> &ModelHistory {
        self.smoother.history(side)
    }

    pub fn reference_distance(&self) -> f64 {
        self.reference_distance
    }

    pub fn thresholds(&self) -> &TrajectoryThresholds {
        &self.thresholds
    }

    /// Number of frames folded in since creation or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Shorthand for [`distance::estimate_distance`].
    pub fn estimate_distance(&self, y0: f64, y1: f64) -> Option<f64> {
        distance::estimate_distance(self, y0, y1)
    }

    /// Forget every rail seen so far; configuration is kept.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.left = None;
        self.right = None;
        self.trajectory = Trajectory::Unknown;
        self.frames = 0;
    }
}

pub(crate) fn validate_reference_distance(d0: f64) -> Result<()> {
    if !d0.is_finite() || d0 <= 0.0 {
        return Err(ConfigError::ReferenceDistance(d0));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
