//! Projection of ground-plane geometry into the image.
//!
//! Camera frame: x right, y down, z forward. The ground plane sits at
//! `y = mount_height_m`. A ground point at lateral offset `X` and forward
//! distance `Z` lands on
//!
//! ```text
//! u = cx + f·X/Z        v = horizon + f·H/Z
//! ```
//!
//! Eliminating `Z`, a ground line of constant `X` is the image line
//! `u = cx − X·horizon/H + (X/H)·v`, which is why rails come out straight in
//! `x = intercept + slope·y` form with `slope = X/H`.

use crate::camera::CameraParams;
use nalgebra::{Matrix3, Point2, Point3};

/// Maps world geometry to pixels and back along the ground plane.
pub trait ProjectionModel {
    /// Pixel coordinates of a camera-frame point, `None` behind the camera.
    fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>>;
    /// `(intercept, slope)` of the image line of the ground line at lateral
    /// offset `lateral_m`, in `x = intercept + slope·y` form.
    fn ground_line(&self, lateral_m: f64) -> (f64, f64);
    /// Forward ground distance seen at image row `row`; `None` at or above
    /// the horizon.
    fn ground_distance_at_row(&self, row: f64) -> Option<f64>;
    /// Image row of the ground at forward distance `distance_m`.
    fn row_at_distance(&self, distance_m: f64) -> Option<f64>;
}

#[derive(Clone, Debug)]
pub struct PinholeCamera {
    pub params: CameraParams,
    /// Intrinsic matrix K
    k: Matrix3<f64>,
}

impl PinholeCamera {
    pub fn new(params: CameraParams) -> Self {
        let f = params.focal_px;
        #[rustfmt::skip]
        let k = Matrix3::new(
            f,   0.0, params.cx,
            0.0, f,   params.horizon_row,
            0.0, 0.0, 1.0,
        );
        Self { params, k }
    }

    /// Pixel position of a ground point.
    pub fn project_ground(&self, lateral_m: f64, distance_m: f64) -> Option<Point2<f64>> {
        self.project(&Point3::new(lateral_m, self.params.mount_height_m, distance_m))
    }

    /// Distance to the bottom row of the frame: the natural reference `d0`.
    pub fn reference_distance(&self) -> f64 {
        self.ground_distance_at_row(self.params.bottom_row())
            .unwrap_or(f64::INFINITY)
    }
}

impl ProjectionModel for PinholeCamera {
    fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        if point.z <= 0.0 {
            return None;
        }
        let h = self.k * point.coords;
        Some(Point2::new(h.x / h.z, h.y / h.z))
    }

    fn ground_line(&self, lateral_m: f64) -> (f64, f64) {
        let slope = lateral_m / self.params.mount_height_m;
        (self.params.cx - slope * self.params.horizon_row, slope)
    }

    fn ground_distance_at_row(&self, row: f64) -> Option<f64> {
        let dv = row - self.params.horizon_row;
        if dv <= 0.0 {
            return None;
        }
        Some(self.params.focal_px * self.params.mount_height_m / dv)
    }

    fn row_at_distance(&self, distance_m: f64) -> Option<f64> {
        if distance_m <= 0.0 {
            return None;
        }
        let p = &self.params;
        Some(p.horizon_row + p.focal_px * p.mount_height_m / distance_m)
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
    fn ground_point_lies_on_its_ground_line() {
        let cam = PinholeCamera::new(CameraParams::default());
        let lateral = -0.7175; // half standard gauge
        let (b, m) = cam.ground_line(lateral);
        for z in [4.0, 12.0, 80.0] {
            let p = cam.project_ground(lateral, z).unwrap();
            assert_abs_diff_eq!(p.x, b + m * p.y, epsilon = 1e-9);
        }
        assert!(m < 0.0, "left rail must slope negative");
    }

    #[test]
    fn row_and_distance_are_inverse() {
        let cam = PinholeCamera::new(CameraParams::default());
        let row = cam.row_at_distance(25.0).unwrap();
        assert_abs_diff_eq!(cam.ground_distance_at_row(row).unwrap(), 25.0, epsilon = 1e-9);
        assert!(cam.ground_distance_at_row(cam.params.horizon_row).is_none());
    }

    #[test]
    fn behind_camera_is_not_projected() {
        let cam = PinholeCamera::new(CameraParams::default());
        assert!(cam.project(&Point3::new(0.0, 1.0, -2.0)).is_none());
    }

    #[test]
    fn reference_distance_matches_bottom_row() {
        let cam = PinholeCamera::new(CameraParams::default());
        // f·H / (720 − 300)
        assert_abs_diff_eq!(cam.reference_distance(), 2500.0 / 420.0, epsilon = 1e-12);
    }
}
