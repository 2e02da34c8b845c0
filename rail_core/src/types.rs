//! Fundamental types shared by every stage of the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Raw detector input
// ---------------------------------------------------------------------------

/// One line segment reported by the external line-segment detector,
/// in image pixel coordinates. Lives for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl RawSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// True when both endpoints share the same row, so `x(y)` has no slope.
    pub fn is_degenerate(&self) -> bool {
        self.y1 == self.y2
    }
}

// ---------------------------------------------------------------------------
// Rail line model
// ---------------------------------------------------------------------------

/// A rail line parametrised as `x = intercept + slope · y`.
///
/// Rails are near-vertical in the image, so x-as-a-function-of-y keeps the
/// slope bounded where the usual y(x) form would blow up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineModel {
    pub intercept: f64,
    pub slope: f64,
}

impl LineModel {
    pub fn new(intercept: f64, slope: f64) -> Self {
        Self { intercept, slope }
    }

    /// Column of the line at image row `y`.
    pub fn x_at(&self, y: f64) -> f64 {
        self.intercept + self.slope * y
    }
}

impl fmt::Display for LineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x = {:.2} + {:.4}·y", self.intercept, self.slope)
    }
}

/// Which rail a cluster was attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RailSide {
    Left,
    Right,
}

impl fmt::Display for RailSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailSide::Left => write!(f, "left"),
            RailSide::Right => write!(f, "right"),
        }
    }
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// Curvature direction of the track ahead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trajectory {
    LeftCurve,
    RightCurve,
    Straight,
    /// Either rail is unset or the slope ratio is undefined.
    #[default]
    Unknown,
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trajectory::LeftCurve => "Left Curve",
            Trajectory::RightCurve => "Right Curve",
            Trajectory::Straight => "Straight Track",
            Trajectory::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Object detections and frame batches
// ---------------------------------------------------------------------------

/// A bounding box from the external object detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    pub class_id: u32,
    pub label: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in pixels, `y2` being the bottom edge.
    pub bbox: [f64; 4],
}

impl ObjectDetection {
    /// Row where the object meets the ground.
    pub fn bottom_row(&self) -> f64 {
        self.bbox[1].max(self.bbox[3])
    }
}

/// Everything the external collaborators deliver for one frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameBatch {
    pub frame_index: u64,
    /// Image height in pixels; the bottom row is the default distance reference.
    pub frame_height: u32,
    pub segments: Vec<RawSegment>,
    #[serde(default)]
    pub objects: Vec<ObjectDetection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_segment_is_degenerate() {
        assert!(RawSegment::new(0, 10, 50, 10).is_degenerate());
        assert!(!RawSegment::new(0, 10, 0, 11).is_degenerate());
    }

    #[test]
    fn trajectory_renders_report_labels() {
        assert_eq!(Trajectory::Unknown.to_string(), "Unknown");
        assert_eq!(Trajectory::LeftCurve.to_string(), "Left Curve");
    }

    #[test]
    fn bottom_row_tolerates_flipped_box() {
        let det = ObjectDetection {
            class_id: 0,
            label: "person".into(),
            confidence: 0.9,
            bbox: [10.0, 300.0, 40.0, 120.0],
        };
        assert_eq!(det.bottom_row(), 300.0);
    }
}
