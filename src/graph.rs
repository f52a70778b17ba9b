use crate::dashboard::{DashboardSpec, LineSeries, PANEL_HEIGHT, Panel};
use crate::error::{DashboardError, DashboardResult};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;

/// Width of a rendered dashboard in pixels
pub const DASHBOARD_WIDTH: u32 = 1200;

/// Height reserved above the panels for the dashboard title
const TITLE_HEIGHT: u32 = 60;

/// Line colors, cycled per panel
const SERIES_COLORS: [RGBColor; 10] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
    RGBColor(255, 151, 255),
    RGBColor(254, 203, 82),
];

/// Renders a dashboard description to an SVG document
///
/// Panels are stacked top to bottom in the order of `spec.panels`, separated by
/// `spec.vertical_spacing` (a fraction of the panel area height). No legend is
/// drawn; each panel carries its own title.
///
/// # Arguments
/// * `spec` - Dashboard produced by [`build_dashboard`](crate::dashboard::build_dashboard)
///
/// # Returns
/// * `DashboardResult<String>` - The SVG markup
///
/// # Examples
/// ```
/// use sheetdash::dashboard::load_dashboard;
/// use sheetdash::graph::render_svg;
///
/// let spec = load_dashboard("price\n1\n2\n3\n".as_bytes(), "prices.csv").unwrap();
/// let svg = render_svg(&spec).unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
pub fn render_svg(spec: &DashboardSpec) -> DashboardResult<String> {
    let plot_height = spec.height.max(PANEL_HEIGHT);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (DASHBOARD_WIDTH, plot_height + TITLE_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let body = root
            .titled(&spec.title, ("sans-serif", 24).into_font())
            .map_err(render_err)?;

        for (panel, area) in spec.panels.iter().zip(split_panels(&body, spec)) {
            draw_panel(&area, panel)?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Cut the area below the title into one band per panel, leaving gaps between them.
fn split_panels<'a>(
    body: &DrawingArea<SVGBackend<'a>, Shift>,
    spec: &DashboardSpec,
) -> Vec<DrawingArea<SVGBackend<'a>, Shift>> {
    let count = spec.panels.len();
    if count == 0 {
        return Vec::new();
    }

    let (_, body_height) = body.dim_in_pixel();
    let gap = (spec.vertical_spacing * f64::from(body_height)).round() as i32;
    let total_gaps = gap * (count as i32 - 1);
    let panel_height = ((body_height as i32 - total_gaps) / count as i32).max(1);

    let mut areas = Vec::with_capacity(count);
    let mut rest = body.clone();
    for i in 0..count {
        if i + 1 == count {
            areas.push(rest);
            break;
        }
        let (panel, below) = rest.split_vertically(panel_height);
        let (_, next) = below.split_vertically(gap);
        areas.push(panel);
        rest = next;
    }
    areas
}

fn draw_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, panel: &Panel) -> DashboardResult<()> {
    let series = &panel.series;
    let x_max = series.x.last().copied().unwrap_or(0).max(1) as f64;
    let (y_min, y_max) = value_bounds(&series.y);

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 16).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)
        .map_err(render_err)?;

    chart.configure_mesh().draw().map_err(render_err)?;

    let color = SERIES_COLORS[(panel.row.saturating_sub(1)) % SERIES_COLORS.len()];
    for segment in segments(series) {
        chart
            .draw_series(plotters::series::LineSeries::new(segment, color.stroke_width(2)))
            .map_err(render_err)?;
    }

    Ok(())
}

/// Runs of consecutive plottable points; gaps break the line.
fn segments(series: &LineSeries) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (x, y) in series.x.iter().zip(series.y.iter()) {
        match y {
            Some(y) => current.push((*x as f64, *y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Largest magnitude an axis bound may take; keeps `max - min` finite.
const AXIS_LIMIT: f64 = f64::MAX / 4.0;

/// Y axis range with a little headroom; flat or empty series get a unit range.
///
/// Values beyond `AXIS_LIMIT` are clipped so the range width never overflows.
fn value_bounds(values: &[Option<f64>]) -> (f64, f64) {
    let mut finite = values.iter().flatten().copied();
    let Some(first) = finite.next() else {
        return (0.0, 1.0);
    };
    let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let min = min.clamp(-AXIS_LIMIT, AXIS_LIMIT);
    let max = max.clamp(-AXIS_LIMIT, AXIS_LIMIT);

    if min == max {
        let pad = (min.abs() * 0.05).max(1.0);
        return (min - pad, max + pad);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn render_err<E: Display>(err: E) -> DashboardError {
    DashboardError::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(y: Vec<Option<f64>>) -> LineSeries {
        LineSeries {
            name: "s".into(),
            x: (0..y.len()).collect(),
            y,
        }
    }

    #[test]
    fn gaps_split_segments() {
        let s = series(vec![Some(1.0), Some(2.0), None, Some(4.0), None, None]);
        assert_eq!(
            segments(&s),
            vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]
        );
    }

    #[test]
    fn bounds_for_flat_and_empty_series() {
        assert_eq!(value_bounds(&[None, None]), (0.0, 1.0));
        assert_eq!(value_bounds(&[Some(5.0), Some(5.0)]), (4.0, 6.0));
        let (lo, hi) = value_bounds(&[Some(0.0), Some(10.0)]);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn bounds_stay_finite_near_f64_max() {
        let (lo, hi) = value_bounds(&[Some(-1e308), Some(1e308)]);
        assert!(lo.is_finite() && hi.is_finite());
        assert!((hi - lo).is_finite() && lo < hi);

        let (lo, hi) = value_bounds(&[Some(f64::MAX), Some(f64::MAX)]);
        assert!((hi - lo).is_finite() && lo < hi);
    }

    #[test]
    fn renders_extreme_finite_values() {
        use crate::dashboard::load_dashboard;

        let spec = load_dashboard("v\n-1e308\n1e308\n".as_bytes(), "extreme.csv").unwrap();
        let svg = render_svg(&spec).unwrap();
        assert!(svg.starts_with("<svg"));
    }
}
