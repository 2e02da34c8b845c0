//! Camera mounting and intrinsic parameters.

use serde::{Deserialize, Serialize};

/// Forward-looking camera mounted above flat ground, no pitch or roll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    /// Image width (pixels)
    pub width: u32,
    /// Image height (pixels)
    pub height: u32,
    /// Focal length (pixels)
    pub focal_px: f64,
    /// Principal point column (pixels)
    pub cx: f64,
    /// Row of the horizon, i.e. the principal point row (pixels)
    pub horizon_row: f64,
    /// Lens height above the rail plane (meters)
    pub mount_height_m: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            focal_px: 1000.0,
            cx: 640.0,
            horizon_row: 300.0,
            mount_height_m: 2.5, // cab-mounted
        }
    }
}

impl CameraParams {
    /// Row index of the bottom edge of the frame.
    pub fn bottom_row(&self) -> f64 {
        self.height as f64
    }
}
