//! Track curvature from the ratio of the smoothed rail slopes.
//!
//! With `x = intercept + slope·y`, the left rail slopes negative and the right
//! positive. On straight track seen head-on their magnitudes match; the ratio
//! `-left.slope / right.slope` drifts below 1 when the track bends left and
//! above 1 when it bends right.

use crate::{
    error::{ConfigError, Result},
    track_state::TrackState,
    types::{LineModel, Trajectory},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryThresholds {
    /// Ratio below which the track curves left
    pub left_ratio: f64,
    /// Ratio above which the track curves right
    pub right_ratio: f64,
}

impl Default for TrajectoryThresholds {
    fn default() -> Self {
        Self {
            left_ratio: 0.8,
            right_ratio: 1.2,
        }
    }
}

impl TrajectoryThresholds {
    pub fn validate(&self) -> Result<()> {
        let ok = self.left_ratio.is_finite()
            && self.right_ratio.is_finite()
            && self.left_ratio >= 0.0
            && self.left_ratio < self.right_ratio;
        if !ok {
            return Err(ConfigError::RatioBounds {
                left: self.left_ratio,
                right: self.right_ratio,
            });
        }
        Ok(())
    }
}

/// Classify the track from the state's smoothed rails.
pub fn classify(state: &TrackState) -> Trajectory {
    classify_models(state.left(), state.right(), state.thresholds())
}

/// Classify from explicit rail models. `Unknown` when either rail is unset
/// or the right slope is zero.
pub fn classify_models(
    left: Option<LineModel>,
    right: Option<LineModel>,
    thresholds: &TrajectoryThresholds,
) -> Trajectory {
    let (Some(left), Some(right)) = (left, right) else {
        return Trajectory::Unknown;
    };
    if right.slope == 0.0 {
        return Trajectory::Unknown;
    }
    let ratio = -left.slope / right.slope;
    if !ratio.is_finite() {
        return Trajectory::Unknown;
    }

    if ratio < thresholds.left_ratio {
        Trajectory::LeftCurve
    } else if ratio > thresholds.right_ratio {
        Trajectory::RightCurve
    } else {
        Trajectory::Straight
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
