//! Axis helpers for the country charts.

/// Tick step that splits [start, stop] into roughly `count` round intervals
/// (1, 2 or 5 times a power of ten), as d3's `tickIncrement` picks them.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let span = (stop - start).abs();
    if span == 0.0 || count == 0 || !span.is_finite() {
        return 0.0;
    }

    let raw = span / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Round an axis maximum up to the next tick so a [0, max] axis ends cleanly
pub fn nice_ceil(max: f64) -> f64 {
    if max.is_nan() || max <= 0.0 || max.is_infinite() {
        return 1.0;
    }
    let step = tick_step(0.0, max, 10);
    if step <= 0.0 {
        return max;
    }
    (max / step).ceil() * step
}

/// Display a death rate with at most two decimals and no trailing zeros
pub fn format_value(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// First and last x of the points, widened when they coincide
pub fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if min == max {
        [min - 1.0, max + 1.0]
    } else {
        [min, max]
    }
}

/// Point whose x is closest to `x`; the earlier point wins a tie
pub fn nearest_point(points: &[(f64, f64)], x: f64) -> Option<(f64, f64)> {
    points
        .iter()
        .copied()
        .min_by(|a, b| (a.0 - x).abs().total_cmp(&(b.0 - x).abs()))
}

/// x value under a terminal column of a plot spanning `left..left + width`
pub fn column_to_x(col: u16, left: u16, width: u16, bounds: [f64; 2]) -> Option<f64> {
    if width == 0 || col < left || col >= left + width {
        return None;
    }
    let frac = if width == 1 {
        0.0
    } else {
        (col - left) as f64 / (width - 1) as f64
    };
    Some(bounds[0] + frac * (bounds[1] - bounds[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_step() {
        assert_eq!(tick_step(0.0, 10.0, 10), 1.0);
        assert_eq!(tick_step(0.0, 47.0, 10), 5.0);
        assert_eq!(tick_step(0.0, 130.0, 10), 10.0);
        assert_eq!(tick_step(0.0, 0.0, 10), 0.0);
    }

    #[test]
    fn test_nice_ceil() {
        assert_eq!(nice_ceil(47.0), 50.0);
        assert_eq!(nice_ceil(12.0), 12.0);
        assert_eq!(nice_ceil(17.0), 18.0);
        assert_eq!(nice_ceil(0.0), 1.0);
        assert!((nice_ceil(0.83) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(3.14159), "3.14");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-0.001), "0");
    }

    #[test]
    fn test_nearest_point() {
        let points = [(2000.0, 3.0), (2005.0, 7.5), (2010.0, 12.0)];
        assert_eq!(nearest_point(&points, 2009.0), Some((2010.0, 12.0)));
        assert_eq!(nearest_point(&points, 2002.5), Some((2000.0, 3.0)));
        assert_eq!(nearest_point(&[], 2000.0), None);
    }

    #[test]
    fn test_column_to_x() {
        let bounds = [2000.0, 2010.0];
        assert_eq!(column_to_x(10, 10, 11, bounds), Some(2000.0));
        assert_eq!(column_to_x(20, 10, 11, bounds), Some(2010.0));
        assert_eq!(column_to_x(15, 10, 11, bounds), Some(2005.0));
        assert_eq!(column_to_x(9, 10, 11, bounds), None);
        assert_eq!(column_to_x(21, 10, 11, bounds), None);
    }

    #[test]
    fn test_x_bounds() {
        assert_eq!(x_bounds(&[(2000.0, 1.0), (2019.0, 2.0)]), [2000.0, 2019.0]);
        assert_eq!(x_bounds(&[(2010.0, 1.0)]), [2009.0, 2011.0]);
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
    }
}
