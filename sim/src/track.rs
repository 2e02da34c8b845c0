//! Ground-truth track geometry and objects on the track.
//!
//! The track is a pair of parallel rails on flat ground. Its lateral offset
//! from the camera axis may change from frame to frame; a track bending away
//! ahead of the train shows up in the near field as exactly that drift.

use serde::{Deserialize, Serialize};

/// Standard gauge between rail centres (meters).
pub const STANDARD_GAUGE_M: f64 = 1.435;

/// How the track's lateral offset evolves over frames.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum OffsetSpec {
    /// Fixed offset (meters, positive = track to the camera's right).
    Constant { offset: f64 },
    /// Linear drift from `start`, clamped to `[-limit, limit]`.
    Drift { start: f64, per_frame: f64, limit: f64 },
    /// Sinusoidal sway around `center`.
    Sway {
        center: f64,
        amplitude: f64,
        period_frames: f64,
    },
}

impl OffsetSpec {
    pub fn offset_at(&self, frame: u64) -> f64 {
        let t = frame as f64;
        match self {
            OffsetSpec::Constant { offset } => *offset,
            OffsetSpec::Drift {
                start,
                per_frame,
                limit,
            } => (start + per_frame * t).clamp(-limit.abs(), limit.abs()),
            OffsetSpec::Sway {
                center,
                amplitude,
                period_frames,
            } => {
                if *period_frames <= 0.0 {
                    return *center;
                }
                center + amplitude * (std::f64::consts::TAU * t / period_frames).sin()
            }
        }
    }
}

/// A straight two-rail track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RailTrack {
    pub gauge_m: f64,
    pub offset: OffsetSpec,
}

impl RailTrack {
    pub fn straight() -> Self {
        Self {
            gauge_m: STANDARD_GAUGE_M,
            offset: OffsetSpec::Constant { offset: 0.0 },
        }
    }

    /// Lateral positions `(left, right)` of the rails at `frame` (meters).
    pub fn rail_offsets(&self, frame: u64) -> (f64, f64) {
        let c = self.offset.offset_at(frame);
        let half = self.gauge_m / 2.0;
        (c - half, c + half)
    }

    /// Lateral position of the track centre line at `frame`.
    pub fn center(&self, frame: u64) -> f64 {
        self.offset.offset_at(frame)
    }
}

/// An object standing on the track, approaching or receding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimObject {
    pub id: u64,
    pub class_id: u32,
    pub label: String,
    pub width_m: f64,
    pub height_m: f64,
    /// Forward distance at frame 0 (meters)
    pub start_distance_m: f64,
    /// Closing speed, meters per frame (negative = receding)
    pub closing_per_frame: f64,
    pub appear_at: Option<u64>,
    pub disappear_at: Option<u64>,
}

impl SimObject {
    /// True forward distance at `frame`.
    pub fn distance_at(&self, frame: u64) -> f64 {
        self.start_distance_m - self.closing_per_frame * frame as f64
    }

    /// True if the object exists at `frame`.
    pub fn is_active(&self, frame: u64) -> bool {
        if let Some(appear) = self.appear_at {
            if frame < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if frame >= disappear {
                return false;
            }
        }
        true
    }
}
