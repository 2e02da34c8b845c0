//! Perspective distance from rail width.
//!
//! Two physically parallel rails of constant gauge, seen through a pinhole
//! camera, have an image-space gauge inversely proportional to the distance of
//! the row. Knowing the real distance `d0` to a reference row `y0`:
//!
//! ```text
//! d(y1) = d0 · width(y0) / width(y1)
//! ```

use crate::{line_model::width_at, track_state::TrackState, types::LineModel};

/// Distance to row `y1` using the state's smoothed rails and reference
/// distance. `None` while either rail is unset or the geometry is degenerate.
pub fn estimate_distance(state: &TrackState, y0: f64, y1: f64) -> Option<f64> {
    distance_from_models(state.left()?, state.right()?, state.reference_distance(), y0, y1)
}

/// Similar-triangles distance from explicit rail models.
///
/// Zero width at `y1` (rails parallel in the image, or crossing exactly there)
/// and non-finite inputs give `None`. Negative results only come from noisy,
/// crossed rails and are clamped to zero.
pub fn distance_from_models(
    left: LineModel,
    right: LineModel,
    d0: f64,
    y0: f64,
    y1: f64,
) -> Option<f64> {
    let w0 = width_at(&left, &right, y0);
    let w1 = width_at(&left, &right, y1);
    if w1 == 0.0 {
        return None;
    }
    let d = d0 * (w0 / w1);
    if !d.is_finite() {
        return None;
    }
    Some(d.max(0.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parallel_rails_return_reference_distance() {
        let left = LineModel::new(-50.0, 0.0);
        let right = LineModel::new(50.0, 0.0);
        for y1 in [0.0, 17.0, 480.0, -3.5] {
            assert_eq!(distance_from_models(left, right, 10.0, 0.0, y1), Some(10.0));
        }
    }

    #[test]
    fn double_width_halves_distance() {
        // width(0) = 100, width(100) = 200
        let left = LineModel::new(-50.0, 0.0);
        let right = LineModel::new(50.0, 1.0);
        let d = distance_from_models(left, right, 10.0, 0.0, 100.0).unwrap();
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn converging_rails_grow_distance_toward_horizon() {
        // Rails meet at y = 100; bottom of frame at y = 500.
        let left = LineModel::new(400.0, -1.0);
        let right = LineModel::new(200.0, 1.0);
        let near = distance_from_models(left, right, 9.5, 500.0, 450.0).unwrap();
        let far = distance_from_models(left, right, 9.5, 500.0, 150.0).unwrap();
        assert!(far > near);
        // width(500) = 800, width(150) = 100
        assert_abs_diff_eq!(far, 9.5 * 8.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_width_row_is_unknown() {
        let left = LineModel::new(400.0, -1.0);
        let right = LineModel::new(200.0, 1.0);
        assert!(distance_from_models(left, right, 9.5, 500.0, 100.0).is_none());
    }

    #[test]
    fn crossed_rails_clamp_to_zero() {
        // Past the crossing point the width turns negative.
        let left = LineModel::new(400.0, -1.0);
        let right = LineModel::new(200.0, 1.0);
        assert_eq!(distance_from_models(left, right, 9.5, 500.0, 50.0), Some(0.0));
    }

    #[test]
    fn non_finite_input_is_unknown() {
        let left = LineModel::new(-50.0, 0.0);
        let right = LineModel::new(50.0, 0.0);
        assert!(distance_from_models(left, right, 10.0, f64::NAN, 3.0).is_none());
    }
}
