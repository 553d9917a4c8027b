use std::path::Path;

use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::data::{EventKind, EventLog};
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Diagnostic plot rendering
// ---------------------------------------------------------------------------
// Every chart is a PNG on disk. A failed render degrades to an error the
// caller records; it never takes the rest of the report down.

const CHART_SIZE: (u32, u32) = (1200, 600);

fn plot_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}

/// Data extent with a 5 % pad; `None` when no finite value exists.
fn padded_bounds<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return None;
    }
    if min == max {
        min -= 1.0;
        max += 1.0;
    }
    let pad = 0.05 * (max - min);
    Some((min - pad, max + pad))
}

/// Marker color per event, matching the report's conventions.
fn event_color(kind: EventKind) -> RGBColor {
    match kind {
        EventKind::Launch => BLUE,
        EventKind::Ignition => RGBColor(255, 140, 0),
        EventKind::Liftoff => GREEN,
        EventKind::LaunchRodClearance => RGBColor(128, 0, 128),
        EventKind::Burnout => RGBColor(139, 69, 19),
        EventKind::EjectionCharge => RGBColor(255, 105, 180),
        EventKind::Apogee => RED,
        EventKind::RecoveryDeviceDeployment => CYAN,
        EventKind::GroundHit => BLACK,
        EventKind::SimulationEnd => MAGENTA,
    }
}

// ---------------------------------------------------------------------------
// Time-series line chart with event markers
// ---------------------------------------------------------------------------

pub fn line_chart(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    x: &[f64],
    y: &[f64],
    color: RGBColor,
    events: Option<&EventLog>,
) -> Result<(), AnalysisError> {
    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    let (x0, x1) = padded_bounds(points.iter().map(|p| p.0))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", title)))?;
    let (y0, y1) = padded_bounds(points.iter().map(|p| p.1))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", title)))?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(58)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            ShapeStyle::from(&color).stroke_width(2),
        ))
        .map_err(plot_err)?
        .label(y_label)
        .legend(move |(x, y)| {
            PathElement::new(
                vec![(x, y), (x + 20, y)],
                ShapeStyle::from(&color).stroke_width(2),
            )
        });

    if let Some(events) = events {
        draw_event_markers(&mut chart, events, (x0, x1), (y0, y1))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

fn draw_event_markers(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    events: &EventLog,
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
) -> Result<(), AnalysisError> {
    let mut markers: Vec<(f64, EventKind)> = events
        .iter()
        .flat_map(|(kind, times)| times.iter().map(move |&t| (t, kind)))
        .filter(|(t, _)| *t >= x0 && *t <= x1)
        .collect();
    markers.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    for (i, (t, kind)) in markers.iter().enumerate() {
        let color = event_color(*kind);
        chart
            .draw_series(DashedLineSeries::new(
                vec![(*t, y0), (*t, y1)],
                6,
                4,
                ShapeStyle::from(&color),
            ))
            .map_err(plot_err)?;
        // Stagger label heights so clustered events stay readable
        let y_text = y1 - (0.04 + 0.05 * (i % 3) as f64) * (y1 - y0);
        chart
            .draw_series(std::iter::once(Text::new(
                kind.label().to_string(),
                (*t, y_text),
                ("sans-serif", 13).into_font().color(&color),
            )))
            .map_err(plot_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Two-panel what-if chart
// ---------------------------------------------------------------------------

pub struct PanelSpec<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub points: &'a [(f64, f64)],
    pub color: RGBColor,
}

/// Two stacked panels sharing one image (payload-mass effect charts).
pub fn two_panel_chart(
    path: &Path,
    top: &PanelSpec<'_>,
    bottom: &PanelSpec<'_>,
) -> Result<(), AnalysisError> {
    let root = BitMapBackend::new(path, (1000, 1000)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let areas = root.split_evenly((2, 1));
    for (area, spec) in areas.iter().zip([top, bottom]) {
        draw_panel(area, spec)?;
    }
    root.present().map_err(plot_err)?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    spec: &PanelSpec<'_>,
) -> Result<(), AnalysisError> {
    let points: Vec<(f64, f64)> = spec
        .points
        .iter()
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .copied()
        .collect();
    let (x0, x1) = padded_bounds(points.iter().map(|p| p.0))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", spec.title)))?;
    let (y0, y1) = padded_bounds(points.iter().map(|p| p.1))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", spec.title)))?;

    let mut chart = ChartBuilder::on(area)
        .caption(spec.title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(64)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            ShapeStyle::from(&spec.color).stroke_width(2),
        ))
        .map_err(plot_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|p| Circle::new(*p, 4, spec.color.filled())),
        )
        .map_err(plot_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Horizontal sensitivity bars
// ---------------------------------------------------------------------------

/// Horizontal bar chart; item order is bottom-to-top, so callers sort
/// ascending to put the largest bar on top.
pub fn horizontal_bar_chart(
    path: &Path,
    title: &str,
    x_label: &str,
    items: &[(String, f64)],
) -> Result<(), AnalysisError> {
    if items.is_empty() {
        return Err(AnalysisError::Plot("no bars to plot".into()));
    }
    let (mut v0, mut v1) = padded_bounds(items.iter().map(|(_, v)| *v))
        .ok_or_else(|| AnalysisError::Plot("no finite bar values".into()))?;
    v0 = v0.min(0.0);
    v1 = v1.max(0.0);

    let root = BitMapBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(190)
        .build_cartesian_2d(v0..v1, (0..items.len()).into_segmented())
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(x_label)
        .y_labels(items.len())
        .y_label_formatter(&|v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => {
                items.get(*i).map(|(name, _)| name.clone()).unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(items.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (*value, SegmentValue::Exact(i + 1)),
                ],
                RGBColor(135, 206, 235).filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Time-colored scatter
// ---------------------------------------------------------------------------

/// Scatter of y against x with points colored by a third axis (time), early
/// samples blue, late samples red.
pub fn scatter_colored(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    x: &[f64],
    y: &[f64],
    t: &[f64],
) -> Result<(), AnalysisError> {
    let points: Vec<(f64, f64, f64)> = x
        .iter()
        .zip(y)
        .zip(t)
        .filter(|((a, b), c)| a.is_finite() && b.is_finite() && c.is_finite())
        .map(|((a, b), c)| (*a, *b, *c))
        .collect();
    let (x0, x1) = padded_bounds(points.iter().map(|p| p.0))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", title)))?;
    let (y0, y1) = padded_bounds(points.iter().map(|p| p.1))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", title)))?;
    let (t0, t1) = padded_bounds(points.iter().map(|p| p.2))
        .ok_or_else(|| AnalysisError::Plot(format!("no finite data points for '{}'", title)))?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(42)
        .y_label_area_size(58)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(plot_err)?;

    let span = (t1 - t0).max(f64::EPSILON);
    chart
        .draw_series(points.iter().map(|(px, py, pt)| {
            let frac = ((pt - t0) / span).clamp(0.0, 1.0);
            // hue sweep blue -> red over the flight
            Circle::new((*px, *py), 3, HSLColor(0.66 * (1.0 - frac), 0.85, 0.45).filled())
        }))
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_padded_and_nan_tolerant() {
        let (lo, hi) = padded_bounds([1.0, f64::NAN, 3.0].into_iter()).unwrap();
        assert!(lo < 1.0 && hi > 3.0);
        assert!(padded_bounds(std::iter::empty()).is_none());
        assert!(padded_bounds([f64::NAN].into_iter()).is_none());
    }

    #[test]
    fn flat_series_still_gets_a_nonzero_range() {
        let (lo, hi) = padded_bounds([2.0, 2.0].into_iter()).unwrap();
        assert!(hi - lo > 1.0);
    }

    #[test]
    fn line_chart_renders_to_disk() {
        let path = std::env::temp_dir().join("rocket_analysis_line_chart_test.png");
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| (v / 5.0).sin()).collect();
        line_chart(
            &path,
            "Test Chart",
            "Time (s)",
            "Value",
            &x,
            &y,
            BLUE,
            None,
        )
        .expect("render succeeds");
        let meta = std::fs::metadata(&path).expect("file written");
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_series_is_a_plot_error_not_a_panic() {
        let path = std::env::temp_dir().join("rocket_analysis_empty_chart_test.png");
        let err = line_chart(&path, "Empty", "x", "y", &[], &[], BLUE, None);
        assert!(matches!(err, Err(AnalysisError::Plot(_))));
    }
}
