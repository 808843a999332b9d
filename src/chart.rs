//! Vitals chart scaling — an ordered numeric series to pixel geometry.
//!
//! Pure math: axis domain, tick positions, and the 2-D point mapping for a
//! line chart on a fixed drawing surface. The frontend renders the returned
//! geometry as SVG verbatim; nothing here knows about colors or markup.

use serde::Serialize;

use crate::models::VitalsPoint;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Number of Y-axis ticks, spanning the domain bounds inclusive.
const Y_TICK_COUNT: usize = 5;

/// Upper bound on X-axis ticks; short series get one tick per point.
const MAX_X_TICKS: usize = 5;

/// Flat-series domain expansion: ±5% of the value, never less than ±1.
/// Guarantees a non-zero-height plotted domain for constant (or single
/// point) series.
const FLAT_EXPANSION_FRACTION: f64 = 0.05;
const FLAT_EXPANSION_MIN: f64 = 1.0;

/// A tick value this close to an integer displays as the integer;
/// otherwise it is shown with exactly one decimal digit.
const TICK_SNAP_EPSILON: f64 = 0.05;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Drawing surface dimensions with usable-area insets on all four sides.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub width: f64,
    pub height: f64,
    pub inset_left: f64,
    pub inset_right: f64,
    pub inset_top: f64,
    pub inset_bottom: f64,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            width: 560.0,
            height: 200.0,
            inset_left: 48.0,
            inset_right: 16.0,
            inset_top: 16.0,
            inset_bottom: 36.0,
        }
    }
}

impl ChartSpec {
    fn usable_width(&self) -> f64 {
        self.width - self.inset_left - self.inset_right
    }

    fn usable_height(&self) -> f64 {
        self.height - self.inset_top - self.inset_bottom
    }
}

/// One series point mapped onto the surface.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub value: f64,
}

/// A Y-axis gridline: pixel position plus display text.
#[derive(Debug, Clone, Serialize)]
pub struct YTick {
    pub y: f64,
    pub value: f64,
    pub text: String,
}

/// An X-axis tick anchored to a series index.
#[derive(Debug, Clone, Serialize)]
pub struct XTick {
    pub x: f64,
    pub index: usize,
    pub label: String,
}

/// Complete geometry for one rendered chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartGeometry {
    pub spec: ChartSpec,
    pub points: Vec<ChartPoint>,
    /// SVG path data: an ordered polyline through all points, no smoothing.
    pub path: String,
    pub y_ticks: Vec<YTick>,
    pub x_ticks: Vec<XTick>,
    pub min_y: f64,
    pub max_y: f64,
}

// ═══════════════════════════════════════════════════════════
// Scaling
// ═══════════════════════════════════════════════════════════

/// Map a vitals series onto the drawing surface.
///
/// Returns `None` for an empty series — the view renders its "No data."
/// placeholder instead of a degenerate chart.
pub fn scale_series(series: &[VitalsPoint], spec: &ChartSpec) -> Option<ChartGeometry> {
    if series.is_empty() {
        return None;
    }
    let n = series.len();

    let (min_y, max_y) = domain(series);

    // Guard against division by zero for the single-point series; the flat
    // expansion above already guarantees max_y > min_y.
    let x_step = spec.usable_width() / (n - 1).max(1) as f64;
    let x = |i: usize| spec.inset_left + i as f64 * x_step;
    // Inverted: pixel rows grow downward while values grow upward.
    let y = |v: f64| spec.inset_top + (max_y - v) * spec.usable_height() / (max_y - min_y);

    let points: Vec<ChartPoint> = series
        .iter()
        .enumerate()
        .map(|(i, p)| ChartPoint {
            x: x(i),
            y: y(p.value),
            label: p.label.clone(),
            value: p.value,
        })
        .collect();

    let path = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let command = if i == 0 { 'M' } else { 'L' };
            format!("{command}{:.2},{:.2}", p.x, p.y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let y_ticks = (0..Y_TICK_COUNT)
        .map(|k| {
            let value = min_y + k as f64 * (max_y - min_y) / (Y_TICK_COUNT - 1) as f64;
            YTick {
                y: y(value),
                value,
                text: format_tick_value(value),
            }
        })
        .collect();

    // Tick indices may coincide at the boundaries when the series is short;
    // accepted, no post-dedup.
    let tick_count = MAX_X_TICKS.min(n);
    let x_ticks = (0..tick_count)
        .map(|k| {
            let index = ((k * (n - 1)) as f64 / (tick_count - 1).max(1) as f64).round() as usize;
            XTick {
                x: x(index),
                index,
                label: series[index].label.clone(),
            }
        })
        .collect();

    Some(ChartGeometry {
        spec: spec.clone(),
        points,
        path,
        y_ticks,
        x_ticks,
        min_y,
        max_y,
    })
}

/// Axis domain: series min/max, with the flat-series expansion applied when
/// they coincide.
fn domain(series: &[VitalsPoint]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for point in series {
        min_y = min_y.min(point.value);
        max_y = max_y.max(point.value);
    }
    if min_y == max_y {
        let bump = (min_y.abs() * FLAT_EXPANSION_FRACTION).max(FLAT_EXPANSION_MIN);
        min_y -= bump;
        max_y += bump;
    }
    (min_y, max_y)
}

/// Tick display formatting: whole-number vitals stay clean, fractional ones
/// keep one decimal.
pub fn format_tick_value(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < TICK_SNAP_EPSILON {
        format!("{}", rounded as i64)
    } else {
        format!("{value:.1}")
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<VitalsPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| VitalsPoint {
                label: format!("Day {}", i + 1),
                value,
            })
            .collect()
    }

    #[test]
    fn empty_series_yields_no_geometry() {
        assert!(scale_series(&[], &ChartSpec::default()).is_none());
    }

    #[test]
    fn points_stay_inside_usable_area_and_x_is_monotonic() {
        let spec = ChartSpec::default();
        let geometry =
            scale_series(&series(&[102.0, 97.5, 110.0, -3.0, 42.0]), &spec).unwrap();

        let y_lo = spec.inset_top;
        let y_hi = spec.inset_top + spec.usable_height();
        for point in &geometry.points {
            assert!(point.y >= y_lo && point.y <= y_hi, "y out of range: {}", point.y);
        }
        for pair in geometry.points.windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
    }

    #[test]
    fn flat_series_domain_is_expanded() {
        let geometry = scale_series(&series(&[5.0, 5.0, 5.0]), &ChartSpec::default()).unwrap();
        // bump = max(1, |5| * 0.05) = 1
        assert!(geometry.min_y < 5.0 && 5.0 < geometry.max_y);
        assert_eq!(geometry.min_y, 4.0);
        assert_eq!(geometry.max_y, 6.0);
    }

    #[test]
    fn single_point_maps_to_left_inset() {
        let spec = ChartSpec::default();
        let geometry = scale_series(&series(&[42.0]), &spec).unwrap();
        assert_eq!(geometry.points.len(), 1);
        assert_eq!(geometry.points[0].x, spec.inset_left);
        // Flat expansion centers the value vertically.
        let mid = spec.inset_top + spec.usable_height() / 2.0;
        assert!((geometry.points[0].y - mid).abs() < 1e-9);
        assert_eq!(geometry.x_ticks.len(), 1);
    }

    #[test]
    fn five_y_ticks_span_the_domain_inclusive() {
        let geometry =
            scale_series(&series(&[100.0, 120.0]), &ChartSpec::default()).unwrap();
        assert_eq!(geometry.y_ticks.len(), 5);
        assert_eq!(geometry.y_ticks[0].value, geometry.min_y);
        assert_eq!(geometry.y_ticks[4].value, geometry.max_y);
        // First tick is the domain minimum, drawn at the bottom of the plot.
        assert!(geometry.y_ticks[0].y > geometry.y_ticks[4].y);
    }

    #[test]
    fn x_tick_count_is_min_of_five_and_series_length() {
        let spec = ChartSpec::default();
        assert_eq!(
            scale_series(&series(&[1.0, 2.0, 3.0]), &spec).unwrap().x_ticks.len(),
            3
        );
        let long = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let ticks = scale_series(&long, &spec).unwrap().x_ticks;
        assert_eq!(ticks.len(), 5);
        // round(k * 6 / 4) for k in 0..5 → 0, 2, 3, 5, 6
        let indices: Vec<usize> = ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 2, 3, 5, 6]);
    }

    #[test]
    fn path_is_an_ordered_polyline() {
        let geometry =
            scale_series(&series(&[100.0, 104.0, 99.0]), &ChartSpec::default()).unwrap();
        assert!(geometry.path.starts_with('M'));
        assert_eq!(geometry.path.matches('L').count(), 2);
        // No smoothing commands.
        assert!(!geometry.path.contains('C') && !geometry.path.contains('Q'));
    }

    #[test]
    fn tick_values_snap_to_integers_within_epsilon() {
        assert_eq!(format_tick_value(100.0), "100");
        assert_eq!(format_tick_value(100.04), "100");
        assert_eq!(format_tick_value(99.96), "100");
        assert_eq!(format_tick_value(100.06), "100.1");
        assert_eq!(format_tick_value(98.55), "98.5"); // f64 0.05 boundary is inexact; shown fractional
        assert_eq!(format_tick_value(-0.02), "0");
        assert_eq!(format_tick_value(102.5), "102.5");
    }

    #[test]
    fn geometry_serializes_for_the_frontend() {
        let geometry =
            scale_series(&series(&[98.6, 101.2]), &ChartSpec::default()).unwrap();
        let json = serde_json::to_string(&geometry).unwrap();
        assert!(json.contains("\"path\""));
        assert!(json.contains("\"y_ticks\""));
        assert!(json.contains("\"min_y\""));
    }
}
