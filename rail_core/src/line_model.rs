//! Conversions between raw segments and `x = intercept + slope·y` line models.

use crate::types::{LineModel, RawSegment};

/// Fit the line through a segment's endpoints.
///
/// Returns `None` for a horizontal segment (`y1 == y2`): slope is undefined in
/// the x-of-y parametrisation and the segment must not reach clustering.
pub fn segment_to_model(segment: &RawSegment) -> Option<LineModel> {
    if segment.is_degenerate() {
        return None;
    }
    let (x1, y1) = (segment.x1 as f64, segment.y1 as f64);
    let (x2, y2) = (segment.x2 as f64, segment.y2 as f64);
    let slope = (x2 - x1) / (y2 - y1);
    Some(LineModel::new(x1 - slope * y1, slope))
}

/// Fit every usable segment, dropping degenerate ones.
pub fn segments_to_models(segments: &[RawSegment]) -> Vec<LineModel> {
    segments.iter().filter_map(segment_to_model).collect()
}

/// Component-wise arithmetic mean of a set of models.
///
/// Accumulates offsets from the first model, so a window of identical
/// models averages back to exactly that model.
pub fn mean_model<'a, I>(models: I) -> Option<LineModel>
where
    I: IntoIterator<Item = &'a LineModel>,
{
    let mut iter = models.into_iter();
    let first = *iter.next()?;
    let (mut n, mut di, mut ds) = (1usize, 0.0, 0.0);
    for m in iter {
        n += 1;
        di += m.intercept - first.intercept;
        ds += m.slope - first.slope;
    }
    Some(LineModel::new(
        first.intercept + di / n as f64,
        first.slope + ds / n as f64,
    ))
}

/// Horizontal rail-to-rail distance in pixels at row `y`.
pub fn width_at(left: &LineModel, right: &LineModel, y: f64) -> f64 {
    right.x_at(y) - left.x_at(y)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fits_line_through_endpoints() {
        let m = segment_to_model(&RawSegment::new(100, 0, 50, 100)).unwrap();
        assert_abs_diff_eq!(m.slope, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.intercept, 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.x_at(100.0), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn endpoint_order_does_not_matter() {
        let a = segment_to_model(&RawSegment::new(10, 20, 40, 80)).unwrap();
        let b = segment_to_model(&RawSegment::new(40, 80, 10, 20)).unwrap();
        assert_abs_diff_eq!(a.slope, b.slope, epsilon = 1e-12);
        assert_abs_diff_eq!(a.intercept, b.intercept, epsilon = 1e-12);
    }

    #[test]
    fn vertical_segment_has_zero_slope() {
        // Zero slope is a valid model, distinct from the degenerate case.
        let m = segment_to_model(&RawSegment::new(30, 0, 30, 90)).unwrap();
        assert_eq!(m, LineModel::new(30.0, 0.0));
    }

    #[test]
    fn horizontal_segment_is_rejected() {
        assert!(segment_to_model(&RawSegment::new(0, 50, 200, 50)).is_none());
        let models = segments_to_models(&[
            RawSegment::new(0, 50, 200, 50),
            RawSegment::new(0, 0, 10, 10),
        ]);
        assert_eq!(models.len(), 1);
    }

    #[test]
    fn mean_of_nothing_is_unset() {
        assert!(mean_model(&Vec::<LineModel>::new()).is_none());
        let m = mean_model(&[LineModel::new(0.0, 1.0), LineModel::new(10.0, 3.0)]).unwrap();
        assert_eq!(m, LineModel::new(5.0, 2.0));
    }
}
