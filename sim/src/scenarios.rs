//! Scenario definitions.
//!
//! Each scenario is a named configuration of camera, track, objects and
//! detector behaviour. All scenarios are deterministic given the same seed.

use crate::{
    segment_sim::{DetectorParams, SegmentSimulator},
    track::{OffsetSpec, RailTrack, SimObject, STANDARD_GAUGE_M},
};
use camera_models::{CameraParams, PinholeCamera};
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// Centred straight track, clean detections, one approaching person
    Straight,
    /// Track drifting right of the camera axis: rails read as a left curve
    LeftCurve,
    /// Track drifting left of the camera axis: rails read as a right curve
    RightCurve,
    /// Straight track with frequent rail misses (detection gaps)
    Intermittent,
    /// Straight track with heavy clutter and sleeper edges
    Cluttered,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub frames: u64,
    pub camera: CameraParams,
    pub track: RailTrack,
    pub objects: Vec<SimObject>,
    pub detector: DetectorParams,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Straight => Self::straight(seed),
            ScenarioKind::LeftCurve => Self::drifting("left_curve", seed, 0.005),
            ScenarioKind::RightCurve => Self::drifting("right_curve", seed, -0.005),
            ScenarioKind::Intermittent => Self::intermittent(seed),
            ScenarioKind::Cluttered => Self::cluttered(seed),
        }
    }

    /// Real-world distance to the frame's bottom row for this camera.
    pub fn reference_distance(&self) -> f64 {
        self.pinhole().reference_distance()
    }

    pub fn pinhole(&self) -> PinholeCamera {
        PinholeCamera::new(self.camera.clone())
    }

    /// Segment simulator seeded from the scenario seed.
    pub fn simulator(&self) -> SegmentSimulator {
        SegmentSimulator::new(self.detector.clone(), self.pinhole(), self.seed)
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Straight
    // -----------------------------------------------------------------------
    fn straight(seed: u64) -> Self {
        Scenario {
            name: "straight".into(),
            seed,
            frames: 120,
            camera: CameraParams::default(),
            track: RailTrack::straight(),
            objects: vec![person(0, 60.0, 0.25, None, None)],
            detector: DetectorParams::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2/3: Drifting track
    // -----------------------------------------------------------------------
    fn drifting(name: &str, seed: u64, per_frame: f64) -> Self {
        Scenario {
            name: name.into(),
            seed,
            frames: 150,
            camera: CameraParams::default(),
            track: RailTrack {
                gauge_m: STANDARD_GAUGE_M,
                offset: OffsetSpec::Drift {
                    start: 0.0,
                    per_frame,
                    limit: 0.45,
                },
            },
            objects: vec![
                person(0, 45.0, 0.1, None, None),
                vehicle(1, 80.0, -0.05, Some(30), None),
            ],
            detector: DetectorParams::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 4: Intermittent detections
    // -----------------------------------------------------------------------
    fn intermittent(seed: u64) -> Self {
        Scenario {
            name: "intermittent".into(),
            seed,
            frames: 200,
            camera: CameraParams::default(),
            track: RailTrack::straight(),
            objects: vec![
                person(0, 40.0, 0.1, None, Some(150)),
                vehicle(1, 90.0, 0.2, Some(50), None),
            ],
            detector: DetectorParams {
                p_detection: 0.5,
                fragments: 3,
                p_object: 0.8,
                ..Default::default()
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 5: Cluttered
    // -----------------------------------------------------------------------
    fn cluttered(seed: u64) -> Self {
        Scenario {
            name: "cluttered".into(),
            seed,
            frames: 150,
            camera: CameraParams::default(),
            track: RailTrack {
                gauge_m: STANDARD_GAUGE_M,
                offset: OffsetSpec::Sway {
                    center: 0.0,
                    amplitude: 0.05,
                    period_frames: 90.0,
                },
            },
            objects: vec![person(0, 35.0, 0.05, None, None)],
            detector: DetectorParams {
                endpoint_noise_px: 3.0,
                lambda_clutter: 1.5,
                sleepers: 6,
                fragments: 6,
                ..Default::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn person(
    id: u64,
    start_distance_m: f64,
    closing_per_frame: f64,
    appear_at: Option<u64>,
    disappear_at: Option<u64>,
) -> SimObject {
    SimObject {
        id,
        class_id: 0,
        label: "person".into(),
        width_m: 0.5,
        height_m: 1.75,
        start_distance_m,
        closing_per_frame,
        appear_at,
        disappear_at,
    }
}

fn vehicle(
    id: u64,
    start_distance_m: f64,
    closing_per_frame: f64,
    appear_at: Option<u64>,
    disappear_at: Option<u64>,
) -> SimObject {
    SimObject {
        id,
        class_id: 2,
        label: "car".into(),
        width_m: 1.8,
        height_m: 1.5,
        start_distance_m,
        closing_per_frame,
        appear_at,
        disappear_at,
    }
}
