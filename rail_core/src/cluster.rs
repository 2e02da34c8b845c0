//! Rail clusterer: splits one frame's segments into left/right rail estimates.
//!
//! # Per-frame steps
//! 1. Fit `(intercept, slope)` to every non-degenerate segment
//! 2. Bail out with nothing when fewer than 2 points survive
//! 3. 2-means (Lloyd) over the feature plane, several seeded k-means++ restarts
//!    run in parallel, lowest inertia wins
//! 4. Attribute each cluster to a rail by the sign of its mean slope,
//!    discarding clusters inside the dead zone
//! 5. Resolve two clusters landing on the same side per [`SideConflictPolicy`]
//!
//! The clusterer keeps no state between frames. Every call re-fits from
//! scratch, and each restart draws from its own RNG stream derived from
//! `seed + restart`, so the same frame always clusters the same way.

use crate::{
    error::{ConfigError, Result},
    line_model::{mean_model, segments_to_models},
    types::{LineModel, RailSide, RawSegment},
};
use nalgebra::Vector2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

/// Number of clusters: one per rail.
const K: usize = 2;

/// Feature point `[intercept, slope]`.
type Point = Vector2<f64>;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// What to do when both clusters resolve to the same rail side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideConflictPolicy {
    /// The cluster processed last replaces the earlier one.
    #[default]
    LastWins,
    /// Members of every cluster on that side are pooled and averaged.
    Merge,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClustererConfig {
    /// Independent k-means++ initialisations per frame
    pub n_init: usize,
    /// Lloyd iteration cap per restart
    pub max_iter: usize,
    /// Convergence threshold on the summed squared centroid shift
    pub tolerance: f64,
    /// Base seed; restart `r` uses `seed + r`
    pub seed: u64,
    /// Mean-slope magnitude at or below which a cluster is neither rail
    pub dead_zone: f64,
    pub side_conflict: SideConflictPolicy,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 0,
            dead_zone: 0.05,
            side_conflict: SideConflictPolicy::LastWins,
        }
    }
}

impl ClustererConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_init == 0 {
            return Err(ConfigError::NoRestarts);
        }
        if self.max_iter == 0 {
            return Err(ConfigError::NoIterations);
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if !self.dead_zone.is_finite() || self.dead_zone < 0.0 {
            return Err(ConfigError::DeadZone(self.dead_zone));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// This frame's unsmoothed rail estimates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutput {
    pub left: Option<LineModel>,
    pub right: Option<LineModel>,
}

impl ClusterOutput {
    fn slot(&mut self, side: RailSide) -> &mut Option<LineModel> {
        match side {
            RailSide::Left => &mut self.left,
            RailSide::Right => &mut self.right,
        }
    }
}

/// Bookkeeping from one clustering call, for logging and frame stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDiagnostics {
    pub segments: usize,
    pub degenerate: usize,
    /// Clusters whose mean slope fell inside the dead zone
    pub discarded: usize,
    /// Clusters that landed on an already-claimed side
    pub side_conflicts: usize,
    /// Within-cluster sum of squares of the winning restart
    pub inertia: Option<f64>,
}

/// Result of a single 2-means fit.
#[derive(Clone, Debug)]
pub struct KMeansFit {
    /// Cluster index per input point
    pub labels: Vec<usize>,
    pub centroids: [Point; K],
    pub inertia: f64,
    pub iterations: usize,
}

// ---------------------------------------------------------------------------
// Clusterer
// ---------------------------------------------------------------------------

/// Owns the clustering settings; re-fits from scratch on every call.
#[derive(Clone, Debug)]
pub struct RailClusterer {
    pub config: ClustererConfig,
}

impl RailClusterer {
    pub fn new(config: ClustererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Cluster one frame's segments into rail estimates.
    pub fn cluster(&self, segments: &[RawSegment]) -> ClusterOutput {
        self.cluster_with_diagnostics(segments).0
    }

    pub fn cluster_with_diagnostics(
        &self,
        segments: &[RawSegment],
    ) -> (ClusterOutput, ClusterDiagnostics) {
        let models = segments_to_models(segments);
        let mut diag = ClusterDiagnostics {
            segments: segments.len(),
            degenerate: segments.len() - models.len(),
            ..Default::default()
        };

        if models.len() < K {
            debug!(
                valid = models.len(),
                "too few usable segments to cluster, no rail update this frame"
            );
            return (ClusterOutput::default(), diag);
        }

        let points: Vec<Point> = models
            .iter()
            .map(|m| Point::new(m.intercept, m.slope))
            .collect();
        let Some(fit) = fit_two_means(&points, &self.config) else {
            return (ClusterOutput::default(), diag);
        };
        diag.inertia = Some(fit.inertia);

        let output = self.assign_sides(&models, &fit.labels, &mut diag);
        debug!(
            left = ?output.left,
            right = ?output.right,
            discarded = diag.discarded,
            inertia = fit.inertia,
            "clustered {} segments",
            models.len()
        );
        (output, diag)
    }

    /// Map clusters to rails by mean-slope sign, in cluster-index order.
    fn assign_sides(
        &self,
        models: &[LineModel],
        labels: &[usize],
        diag: &mut ClusterDiagnostics,
    ) -> ClusterOutput {
        let dead_zone = self.config.dead_zone;
        let mut output = ClusterOutput::default();
        let mut pooled: [Vec<LineModel>; 2] = [Vec::new(), Vec::new()];

        for k in 0..K {
            let members: Vec<LineModel> = models
                .iter()
                .zip(labels)
                .filter(|(_, &l)| l == k)
                .map(|(m, _)| *m)
                .collect();
            let Some(group) = mean_model(&members) else {
                continue;
            };

            let side = if group.slope < -dead_zone {
                RailSide::Left
            } else if group.slope > dead_zone {
                RailSide::Right
            } else {
                trace!(cluster = k, slope = group.slope, "cluster inside slope dead zone");
                diag.discarded += 1;
                continue;
            };

            let slot = output.slot(side);
            if slot.is_some() {
                diag.side_conflicts += 1;
                warn!(
                    cluster = k,
                    %side,
                    policy = ?self.config.side_conflict,
                    "both clusters resolved to the same rail"
                );
            }
            match self.config.side_conflict {
                SideConflictPolicy::LastWins => *slot = Some(group),
                SideConflictPolicy::Merge => {
                    let pool = &mut pooled[side as usize];
                    pool.extend_from_slice(&members);
                    *slot = mean_model(pool.iter());
                }
            }
        }

        output
    }
}

/// Stateless convenience wrapper around [`RailClusterer::cluster`].
pub fn cluster_segments(segments: &[RawSegment], config: &ClustererConfig) -> ClusterOutput {
    RailClusterer {
        config: config.clone(),
    }
    .cluster(segments)
}

// ---------------------------------------------------------------------------
// 2-means
// ---------------------------------------------------------------------------

/// Best-of-`n_init` 2-means fit. `None` when there are fewer than two points.
pub fn fit_two_means(points: &[Point], config: &ClustererConfig) -> Option<KMeansFit> {
    if points.len() < K {
        return None;
    }
    let n_init = config.n_init.max(1);

    (0..n_init)
        .into_par_iter()
        .map(|restart| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(restart as u64));
            let init = kmeans_plus_plus(points, &mut rng);
            let fit = lloyd(points, init, config.max_iter, config.tolerance);
            trace!(
                restart,
                inertia = fit.inertia,
                iterations = fit.iterations,
                "k-means restart finished"
            );
            (restart, fit)
        })
        .min_by(|(ra, a), (rb, b)| {
            a.inertia
                .partial_cmp(&b.inertia)
                .unwrap_or(Ordering::Equal)
                .then(ra.cmp(rb))
        })
        .map(|(_, fit)| fit)
}

/// k-means++ seeding: first centre uniform, second drawn proportional to
/// squared distance from the first.
fn kmeans_plus_plus(points: &[Point], rng: &mut ChaCha8Rng) -> [Point; K] {
    let first = points[rng.gen_range(0..points.len())];
    let d2: Vec<f64> = points.iter().map(|p| (p - first).norm_squared()).collect();
    let total: f64 = d2.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        // Every point coincides with the first centre.
        return [first, first];
    }

    let mut target = rng.gen::<f64>() * total;
    for (p, &w) in points.iter().zip(&d2) {
        if target < w {
            return [first, *p];
        }
        target -= w;
    }
    // Rounding left `target` marginally above zero: take the farthest point.
    let far = d2
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    [first, points[far]]
}

/// Lloyd refinement from the given centres.
fn lloyd(points: &[Point], mut centroids: [Point; K], max_iter: usize, tol: f64) -> KMeansFit {
    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iter {
        iterations += 1;
        assign(points, &centroids, &mut labels);

        let mut sums = [Point::zeros(); K];
        let mut counts = [0usize; K];
        for (p, &l) in points.iter().zip(&labels) {
            sums[l] += p;
            counts[l] += 1;
        }

        let mut next = centroids;
        for k in 0..K {
            if counts[k] > 0 {
                next[k] = sums[k] / counts[k] as f64;
            } else if let Some(p) = farthest_point(points, &centroids, &labels) {
                // Empty cluster: re-seed on the worst-fitted point.
                next[k] = p;
            }
        }

        let shift: f64 = (0..K).map(|k| (next[k] - centroids[k]).norm_squared()).sum();
        centroids = next;
        if shift <= tol {
            break;
        }
    }

    assign(points, &centroids, &mut labels);
    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| (p - centroids[l]).norm_squared())
        .sum();

    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Nearest-centre labelling; ties go to the lower index.
fn assign(points: &[Point], centroids: &[Point; K], labels: &mut [usize]) {
    for (p, label) in points.iter().zip(labels.iter_mut()) {
        let d0 = (p - centroids[0]).norm_squared();
        let d1 = (p - centroids[1]).norm_squared();
        *label = if d1 < d0 { 1 } else { 0 };
    }
}

fn farthest_point(points: &[Point], centroids: &[Point; K], labels: &[usize]) -> Option<Point> {
    points
        .iter()
        .zip(labels)
        .map(|(p, &l)| (p, (p - centroids[l]).norm_squared()))
        .filter(|(_, d)| *d > 0.0)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(p, _)| *p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Segment from the line `x = intercept + slope·y` between rows `y1` and `y2`.
    fn seg(intercept: f64, slope: f64, y1: i32, y2: i32) -> RawSegment {
        let x = |y: i32| (intercept + slope * y as f64).round() as i32;
        RawSegment::new(x(y1), y1, x(y2), y2)
    }

    fn rails() -> Vec<RawSegment> {
        vec![
            seg(700.0, -0.5, 400, 600),
            seg(702.0, -0.5, 420, 620),
            seg(698.0, -0.5, 380, 580),
            seg(100.0, 0.5, 400, 600),
            seg(102.0, 0.5, 420, 620),
            seg(98.0, 0.5, 380, 580),
        ]
    }

    #[test]
    fn empty_frame_yields_nothing() {
        let out = cluster_segments(&[], &ClustererConfig::default());
        assert_eq!(out, ClusterOutput::default());
    }

    #[test]
    fn single_usable_segment_is_not_clustered() {
        let segments = vec![
            seg(700.0, -0.5, 400, 600),
            RawSegment::new(0, 500, 300, 500), // horizontal sleeper edge
        ];
        let clusterer = RailClusterer::new(ClustererConfig::default()).unwrap();
        let (out, diag) = clusterer.cluster_with_diagnostics(&segments);
        assert_eq!(out, ClusterOutput::default());
        assert_eq!(diag.degenerate, 1);
        assert!(diag.inertia.is_none());
    }

    #[test]
    fn separates_converging_rails_by_slope_sign() {
        let out = cluster_segments(&rails(), &ClustererConfig::default());
        let left = out.left.expect("left rail");
        let right = out.right.expect("right rail");
        assert_abs_diff_eq!(left.slope, -0.5, epsilon = 0.02);
        assert_abs_diff_eq!(left.intercept, 700.0, epsilon = 5.0);
        assert_abs_diff_eq!(right.slope, 0.5, epsilon = 0.02);
        assert_abs_diff_eq!(right.intercept, 100.0, epsilon = 5.0);
    }

    #[test]
    fn input_order_does_not_change_result() {
        let cfg = ClustererConfig::default();
        let mut reversed = rails();
        reversed.reverse();
        let a = cluster_segments(&rails(), &cfg);
        let b = cluster_segments(&reversed, &cfg);
        assert_abs_diff_eq!(a.left.unwrap().slope, b.left.unwrap().slope, epsilon = 1e-9);
        assert_abs_diff_eq!(a.right.unwrap().slope, b.right.unwrap().slope, epsilon = 1e-9);
    }

    #[test]
    fn near_flat_cluster_is_discarded() {
        // Left rail plus a cluster of almost-vertical lines with |slope| < 0.05.
        let segments = vec![
            seg(700.0, -0.5, 400, 600),
            seg(701.0, -0.5, 410, 610),
            seg(100.0, 0.01, 400, 600),
            seg(101.0, 0.0, 400, 600),
        ];
        let clusterer = RailClusterer::new(ClustererConfig::default()).unwrap();
        let (out, diag) = clusterer.cluster_with_diagnostics(&segments);
        assert!(out.left.is_some());
        assert!(out.right.is_none());
        assert_eq!(diag.discarded, 1);
    }

    #[test]
    fn same_side_last_wins_keeps_later_cluster() {
        // Two well-separated groups, both negative slope.
        let segments = vec![
            seg(700.0, -0.5, 400, 600),
            seg(700.0, -0.5, 420, 620),
            seg(100.0, -0.3, 400, 600),
            seg(100.0, -0.3, 420, 620),
        ];
        let config = ClustererConfig::default();
        let clusterer = RailClusterer::new(config.clone()).unwrap();
        let (out, diag) = clusterer.cluster_with_diagnostics(&segments);
        assert!(out.right.is_none());
        assert_eq!(diag.side_conflicts, 1);

        // Same fit the clusterer ran: cluster 1 is processed after cluster 0.
        let models = segments_to_models(&segments);
        let points: Vec<Point> = models
            .iter()
            .map(|m| Point::new(m.intercept, m.slope))
            .collect();
        let fit = fit_two_means(&points, &config).unwrap();
        let members = |k: usize| -> Vec<LineModel> {
            models
                .iter()
                .zip(&fit.labels)
                .filter(|(_, &l)| l == k)
                .map(|(m, _)| *m)
                .collect()
        };
        let (first, last) = (members(0), members(1));
        assert_eq!(first.len(), 2);
        assert_eq!(last.len(), 2);
        assert_eq!(out.left, mean_model(&last));
        assert_ne!(out.left, mean_model(&first));
    }

    #[test]
    fn same_side_merge_pools_members() {
        let segments = vec![
            seg(700.0, -0.5, 400, 600),
            seg(700.0, -0.5, 420, 620),
            seg(100.0, -0.3, 400, 600),
            seg(100.0, -0.3, 420, 620),
        ];
        let cfg = ClustererConfig {
            side_conflict: SideConflictPolicy::Merge,
            ..Default::default()
        };
        let out = cluster_segments(&segments, &cfg);
        let left = out.left.unwrap();
        assert_abs_diff_eq!(left.intercept, 400.0, epsilon = 2.0);
        assert_abs_diff_eq!(left.slope, -0.4, epsilon = 0.01);
    }

    #[test]
    fn identical_points_do_not_panic() {
        let segments = vec![seg(700.0, -0.5, 400, 600); 5];
        let out = cluster_segments(&segments, &ClustererConfig::default());
        assert!(out.left.is_some());
        assert!(out.right.is_none());
    }

    #[test]
    fn two_means_finds_obvious_split() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(101.0, 0.0),
        ];
        let fit = fit_two_means(&points, &ClustererConfig::default()).unwrap();
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[2], fit.labels[3]);
        assert_ne!(fit.labels[0], fit.labels[2]);
        assert_abs_diff_eq!(fit.inertia, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn same_seed_same_fit() {
        let points: Vec<Point> = (0..40)
            .map(|i| Point::new((i * 37 % 101) as f64, (i % 7) as f64 * 0.1))
            .collect();
        let cfg = ClustererConfig::default();
        let a = fit_two_means(&points, &cfg).unwrap();
        let b = fit_two_means(&points, &cfg).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn rejects_zero_restarts() {
        let cfg = ClustererConfig {
            n_init: 0,
            ..Default::default()
        };
        assert_eq!(RailClusterer::new(cfg).unwrap_err(), ConfigError::NoRestarts);
    }
}
