//! Temporal smoother: per-side sliding-window mean of rail models.
//!
//! Must be fed once per frame for both sides, including frames where the
//! clusterer found nothing. A side with history keeps exposing its window
//! mean through detection gaps; a side that never saw a detection stays unset.

use crate::{
    cluster::ClusterOutput,
    error::Result,
    history::ModelHistory,
    types::{LineModel, RailSide},
};
use tracing::trace;

#[derive(Clone, Debug, Default)]
pub struct TemporalSmoother {
    left: ModelHistory,
    right: ModelHistory,
}

impl TemporalSmoother {
    /// Fails with [`ConfigError::HistoryLength`](crate::ConfigError) when
    /// `history_len` is zero.
    pub fn new(history_len: usize) -> Result<Self> {
        Ok(Self {
            left: ModelHistory::new(history_len)?,
            right: ModelHistory::new(history_len)?,
        })
    }

    /// Record this frame's candidate for `side` (if any) and return the
    /// smoothed model for that side.
    pub fn update(&mut self, side: RailSide, candidate: Option<LineModel>) -> Option<LineModel> {
        let history = self.history_mut(side);
        if let Some(model) = candidate {
            history.push(model);
        }
        let smoothed = history.mean();
        trace!(
            %side,
            window = history.len(),
            fresh = candidate.is_some(),
            "smoothed rail {:?}",
            smoothed
        );
        smoothed
    }

    /// Update both sides from one frame's clustering result.
    pub fn update_frame(&mut self, raw: &ClusterOutput) -> (Option<LineModel>, Option<LineModel>) {
        let left = self.update(RailSide::Left, raw.left);
        let right = self.update(RailSide::Right, raw.right);
        (left, right)
    }

    pub fn history(&self, side: RailSide) -> &ModelHistory {
        match side {
            RailSide::Left => &self.left,
            RailSide::Right => &self.right,
        }
    }

    fn history_mut(&mut self, side: RailSide) -> &mut ModelHistory {
        match side {
            RailSide::Left => &mut self.left,
            RailSide::Right => &mut self.right,
        }
    }

    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unseen_side_stays_unset() {
        let mut s = TemporalSmoother::new(10).unwrap();
        assert!(s.update(RailSide::Left, None).is_none());
        let raw = ClusterOutput {
            left: Some(LineModel::new(1.0, -1.0)),
            right: None,
        };
        let (l, r) = s.update_frame(&raw);
        assert!(l.is_some());
        assert!(r.is_none());
    }

    #[test]
    fn full_window_of_same_value_equals_value() {
        let n = 10;
        let mut s = TemporalSmoother::new(n).unwrap();
        s.update(RailSide::Right, Some(LineModel::new(500.0, 3.0)));
        let target = LineModel::new(120.0, 0.7);
        let mut last = None;
        for _ in 0..=n {
            last = s.update(RailSide::Right, Some(target));
        }
        let m = last.unwrap();
        assert_eq!(m, target);
        assert_eq!(s.history(RailSide::Right).len(), n);
    }

    #[test]
    fn gap_frames_keep_estimate() {
        let mut s = TemporalSmoother::new(4).unwrap();
        s.update(RailSide::Left, Some(LineModel::new(10.0, -0.5)));
        let before = s.update(RailSide::Left, Some(LineModel::new(12.0, -0.7)));
        for _ in 0..20 {
            assert_eq!(s.update(RailSide::Left, None), before);
        }
        let m = before.unwrap();
        assert_abs_diff_eq!(m.intercept, 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.slope, -0.6, epsilon = 1e-12);
    }

    #[test]
    fn sides_are_independent() {
        let mut s = TemporalSmoother::new(2).unwrap();
        s.update(RailSide::Left, Some(LineModel::new(1.0, -1.0)));
        s.update(RailSide::Left, Some(LineModel::new(3.0, -1.0)));
        s.update(RailSide::Left, Some(LineModel::new(5.0, -1.0)));
        assert_eq!(s.history(RailSide::Left).len(), 2);
        assert!(s.history(RailSide::Right).is_empty());
    }

    #[test]
    fn zero_window_is_a_config_error() {
        assert!(matches!(
            TemporalSmoother::new(0),
            Err(crate::ConfigError::HistoryLength(0))
        ));
        assert_eq!(TemporalSmoother::default().history(RailSide::Left).capacity(), 10);
    }
}
