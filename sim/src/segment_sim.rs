//! Line-segment detector simulator.
//!
//! Generates per-frame segment batches with:
//! - Per-rail miss probability (1 - P_D)
//! - Rail fragmentation into several short segments
//! - Uniform endpoint pixel noise
//! - Poisson clutter (random edges inside the region of interest)
//! - Horizontal sleeper edges between the rails (degenerate segments)
//!
//! and object bounding boxes for the objects on the track.

use crate::track::{RailTrack, SimObject};
use camera_models::{PinholeCamera, ProjectionModel};
use rail_core::{
    metrics::GroundTruth,
    trajectory::{classify_models, TrajectoryThresholds},
    FrameBatch, LineModel, ObjectDetection, RawSegment,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Behaviour of the simulated external segment detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Probability that a rail produces any segment in a frame
    pub p_detection: f64,
    /// Segments emitted per detected rail
    pub fragments: usize,
    /// Minimum fragment length (rows)
    pub min_fragment_rows: f64,
    /// Endpoint noise half-width (pixels, uniform)
    pub endpoint_noise_px: f64,
    /// Mean number of clutter segments per frame
    pub lambda_clutter: f64,
    /// Horizontal sleeper edges per frame
    pub sleepers: usize,
    /// Top of the region of interest, as a fraction of the way from the
    /// horizon to the bottom row
    pub roi_top_fraction: f64,
    /// Probability that a visible object is reported
    pub p_object: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            p_detection: 0.95,
            fragments: 4,
            min_fragment_rows: 40.0,
            endpoint_noise_px: 1.5,
            lambda_clutter: 0.0,
            sleepers: 2,
            roi_top_fraction: 0.35,
            p_object: 1.0,
        }
    }
}

/// Turns ground-truth geometry into detector output, frame by frame.
pub struct SegmentSimulator {
    pub params: DetectorParams,
    pub camera: PinholeCamera,
    rng: ChaCha8Rng,
}

impl SegmentSimulator {
    pub fn new(params: DetectorParams, camera: PinholeCamera, seed: u64) -> Self {
        Self {
            params,
            camera,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Noise-free image lines of both rails at `frame`.
    pub fn true_rails(&self, track: &RailTrack, frame: u64) -> (LineModel, LineModel) {
        let (xl, xr) = track.rail_offsets(frame);
        let (bl, ml) = self.camera.ground_line(xl);
        let (br, mr) = self.camera.ground_line(xr);
        (LineModel::new(bl, ml), LineModel::new(br, mr))
    }

    fn roi_rows(&self) -> (f64, f64) {
        let p = &self.camera.params;
        let bottom = p.bottom_row();
        let top = p.horizon_row + (bottom - p.horizon_row) * self.params.roi_top_fraction;
        (top, bottom)
    }

    /// Generate the detector output and ground truth for one frame.
    pub fn generate_frame(
        &mut self,
        frame: u64,
        track: &RailTrack,
        objects: &[SimObject],
    ) -> (FrameBatch, GroundTruth) {
        let (left, right) = self.true_rails(track, frame);
        let mut segments = Vec::new();

        // True rail fragments
        for rail in [left, right] {
            if self.rng.gen::<f64>() > self.params.p_detection {
                continue;
            }
            for _ in 0..self.params.fragments {
                segments.push(self.rail_fragment(&rail));
            }
        }

        // Sleeper edges: horizontal, spanning the rails
        let (top, bottom) = self.roi_rows();
        for _ in 0..self.params.sleepers {
            let y = self.rng.gen_range(top..bottom);
            let xa = left.x_at(y) - 15.0;
            let xb = right.x_at(y) + 15.0;
            let y = y.round() as i32;
            segments.push(RawSegment::new(xa.round() as i32, y, xb.round() as i32, y));
        }

        // Clutter (Poisson)
        let n_clutter = self.poisson(self.params.lambda_clutter);
        for _ in 0..n_clutter {
            segments.push(self.clutter_segment());
        }

        segments.shuffle(&mut self.rng);

        // Objects
        let mut detections = Vec::new();
        let mut object_distances = Vec::new();
        for obj in objects.iter().filter(|o| o.is_active(frame)) {
            let Some(det) = self.detect_object(obj, track, frame) else {
                continue;
            };
            if self.rng.gen::<f64>() > self.params.p_object {
                continue;
            }
            detections.push(det);
            object_distances.push(obj.distance_at(frame));
        }

        let truth = GroundTruth {
            frame_index: frame,
            trajectory: classify_models(
                Some(left),
                Some(right),
                &TrajectoryThresholds::default(),
            ),
            object_distances,
        };
        let batch = FrameBatch {
            frame_index: frame,
            frame_height: self.camera.params.height,
            segments,
            objects: detections,
        };
        (batch, truth)
    }

    fn rail_fragment(&mut self, rail: &LineModel) -> RawSegment {
        let (top, bottom) = self.roi_rows();
        let min_len = self.params.min_fragment_rows.min(bottom - top);
        let y_a = self.rng.gen_range(top..=(bottom - min_len));
        let y_b = self.rng.gen_range((y_a + min_len)..=bottom);
        let noise = self.params.endpoint_noise_px;
        let jitter = |rng: &mut ChaCha8Rng| rng.gen::<f64>() * noise * 2.0 - noise;
        let x_a = rail.x_at(y_a) + jitter(&mut self.rng);
        let x_b = rail.x_at(y_b) + jitter(&mut self.rng);
        RawSegment::new(
            x_a.round() as i32,
            y_a.round() as i32,
            x_b.round() as i32,
            y_b.round() as i32,
        )
    }

    fn clutter_segment(&mut self) -> RawSegment {
        let (top, bottom) = self.roi_rows();
        let w = self.camera.params.width as f64;
        let point = |rng: &mut ChaCha8Rng| {
            (
                rng.gen_range(0.0..w).round() as i32,
                rng.gen_range(top..bottom).round() as i32,
            )
        };
        let (x1, y1) = point(&mut self.rng);
        let (x2, y2) = point(&mut self.rng);
        RawSegment::new(x1, y1, x2, y2)
    }

    fn detect_object(
        &self,
        obj: &SimObject,
        track: &RailTrack,
        frame: u64,
    ) -> Option<ObjectDetection> {
        let z = obj.distance_at(frame);
        let base = self.camera.project_ground(track.center(frame), z)?;
        let p = &self.camera.params;
        if base.y > p.bottom_row() || base.y <= p.horizon_row {
            return None;
        }
        let scale = p.focal_px / z;
        let half_w = obj.width_m * scale / 2.0;
        let h = obj.height_m * scale;
        Some(ObjectDetection {
            class_id: obj.class_id,
            label: obj.label.clone(),
            confidence: 0.9,
            bbox: [base.x - half_w, base.y - h, base.x + half_w, base.y],
        })
    }

    /// Poisson draw by multiplying uniforms until the product drops below `e^-lambda`.
    fn poisson(&mut self, lambda: f64) -> usize {
        if lambda <= 0.0 {
            return 0;
        }
        let threshold = (-lambda).exp();
        let mut n = 0usize;
        let mut prod = self.rng.gen::<f64>();
        while prod > threshold && n < 50 {
            prod *= self.rng.gen::<f64>();
            n += 1;
        }
        n
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
