//! Estimation metrics against ground truth: distance RMSE / relative error,
//! trajectory accuracy, rail availability.

use crate::{pipeline::FrameOutput, types::Trajectory};
use serde::{Deserialize, Serialize};

/// Ground truth for one frame. `object_distances[i]` belongs to the frame's
/// `i`-th detected object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundTruth {
    pub frame_index: u64,
    pub trajectory: Trajectory,
    pub object_distances: Vec<f64>,
}

/// Accumulated metric statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EstimationMetrics {
    /// Number of frames evaluated
    pub n_frames: u64,
    /// Frames where both smoothed rails were available
    pub frames_with_rails: u64,
    /// Objects seen across all frames
    pub n_objects: u64,
    /// Objects whose distance came back unknown
    pub n_unknown_distance: u64,
    /// Sum of squared distance errors (for RMSE)
    pub sum_sq_dist_err: f64,
    /// Sum of |error| / truth (for mean relative error)
    pub sum_rel_dist_err: f64,
    /// Known estimates with a positive true distance (relative error terms)
    pub n_rel_evaluated: u64,
    /// Frames whose ground-truth trajectory is known
    pub trajectory_evaluated: u64,
    pub trajectory_correct: u64,
}

impl EstimationMetrics {
    /// Objects with a numeric estimate.
    pub fn n_known_distance(&self) -> u64 {
        self.n_objects - self.n_unknown_distance
    }

    /// Root-mean-square distance error over objects with an estimate.
    pub fn rmse_distance(&self) -> f64 {
        let n = self.n_known_distance();
        if n == 0 {
            return 0.0;
        }
        (self.sum_sq_dist_err / n as f64).sqrt()
    }

    /// Mean |error| / truth over objects with an estimate and a positive
    /// true distance.
    pub fn mean_relative_error(&self) -> f64 {
        if self.n_rel_evaluated == 0 {
            return 0.0;
        }
        self.sum_rel_dist_err / self.n_rel_evaluated as f64
    }

    /// Fraction of evaluated frames whose trajectory matched.
    pub fn trajectory_accuracy(&self) -> f64 {
        if self.trajectory_evaluated == 0 {
            return 1.0;
        }
        self.trajectory_correct as f64 / self.trajectory_evaluated as f64
    }

    /// Fraction of frames with both rails available.
    pub fn rail_availability(&self) -> f64 {
        if self.n_frames == 0 {
            return 0.0;
        }
        self.frames_with_rails as f64 / self.n_frames as f64
    }

    /// Accumulate one frame's output against its ground truth.
    pub fn accumulate(&mut self, output: &FrameOutput, truth: &GroundTruth) {
        self.n_frames += 1;
        if output.left.is_some() && output.right.is_some() {
            self.frames_with_rails += 1;
        }

        if truth.trajectory != Trajectory::Unknown {
            self.trajectory_evaluated += 1;
            if output.trajectory == truth.trajectory {
                self.trajectory_correct += 1;
            }
        }

        for (est, &true_d) in output.objects.iter().zip(&truth.object_distances) {
            self.n_objects += 1;
            match est.distance {
                Some(d) => {
                    let err = d - true_d;
                    self.sum_sq_dist_err += err * err;
                    if true_d > 0.0 {
                        self.sum_rel_dist_err += err.abs() / true_d;
                        self.n_rel_evaluated += 1;
                    }
                }
                None => self.n_unknown_distance += 1,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::ClusterOutput,
        pipeline::{FrameStats, ObjectEstimate},
        types::{LineModel, ObjectDetection},
    };
    use approx::assert_abs_diff_eq;

    fn output(trajectory: Trajectory, distances: &[Option<f64>]) -> FrameOutput {
        let rail = Some(LineModel::new(0.0, 1.0));
        FrameOutput {
            frame_index: 0,
            raw: ClusterOutput::default(),
            left: rail,
            right: rail,
            trajectory,
            reference_row: 600.0,
            objects: distances
                .iter()
                .map(|&distance| ObjectEstimate {
                    detection: ObjectDetection {
                        class_id: 0,
                        label: "car".into(),
                        confidence: 1.0,
                        bbox: [0.0; 4],
                    },
                    distance,
                })
                .collect(),
            stats: FrameStats::default(),
        }
    }

    #[test]
    fn accumulates_distance_errors() {
        let mut m = EstimationMetrics::default();
        let truth = GroundTruth {
            frame_index: 0,
            trajectory: Trajectory::Straight,
            object_distances: vec![10.0, 20.0, 30.0],
        };
        m.accumulate(&output(Trajectory::Straight, &[Some(13.0), Some(16.0), None]), &truth);
        assert_eq!(m.n_objects, 3);
        assert_eq!(m.n_unknown_distance, 1);
        // errors 3 and -4
        assert_abs_diff_eq!(m.rmse_distance(), (12.5f64).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.mean_relative_error(), (0.3 + 0.2) / 2.0, epsilon = 1e-12);
        assert_eq!(m.trajectory_accuracy(), 1.0);
        assert_eq!(m.rail_availability(), 1.0);
    }

    #[test]
    fn unknown_truth_is_not_scored() {
        let mut m = EstimationMetrics::default();
        let truth = GroundTruth {
            frame_index: 0,
            trajectory: Trajectory::Unknown,
            object_distances: vec![],
        };
        m.accumulate(&output(Trajectory::LeftCurve, &[]), &truth);
        assert_eq!(m.trajectory_evaluated, 0);
        assert_eq!(m.rmse_distance(), 0.0);
    }

    #[test]
    fn zero_truth_is_left_out_of_relative_error() {
        let mut m = EstimationMetrics::default();
        let truth = GroundTruth {
            frame_index: 0,
            trajectory: Trajectory::Straight,
            object_distances: vec![0.0, 10.0],
        };
        m.accumulate(&output(Trajectory::Straight, &[Some(1.0), Some(12.0)]), &truth);
        assert_eq!(m.n_known_distance(), 2);
        assert_eq!(m.n_rel_evaluated, 1);
        assert_abs_diff_eq!(m.mean_relative_error(), 0.2, epsilon = 1e-12);
        // Both objects still count towards the RMSE.
        assert_abs_diff_eq!(m.rmse_distance(), (2.5f64).sqrt(), epsilon = 1e-12);
    }
}
