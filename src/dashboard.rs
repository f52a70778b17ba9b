//! Building a multi-panel dashboard description from a dataset.
//!
//! One line-chart panel is produced per numeric column, stacked vertically.
//! The spacing between panels and the overall height are explicit functions
//! of the panel count (see [`vertical_spacing`] and [`dashboard_height`]).

use crate::dataset::{Column, ColumnKind, Dataset};
use crate::error::{DashboardError, DashboardResult};
use crate::title::format_title;
use log::{debug, info};
use serde::Serialize;
use std::io::Read;

/// Spacing between panels (fraction of total height) for dashboards of up to two panels
pub const BASE_SPACING: f64 = 0.05;

/// Pixel height given to each panel
pub const PANEL_HEIGHT: u32 = 300;

/// Visual theme the renderer should apply
pub const THEME: &str = "plotly_white";

/// Line series plotted inside one panel
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineSeries {
    /// Series display name, equal to the panel title
    pub name: String,

    /// Row indices (0-based)
    pub x: Vec<usize>,

    /// Column values; `None` marks a gap
    pub y: Vec<Option<f64>>,
}

/// One chart within the dashboard
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Panel {
    /// 1-based vertical position
    pub row: usize,

    /// Raw column identifier the panel was built from
    pub column: String,

    /// Formatted title shown above the panel
    pub title: String,

    pub series: LineSeries,
}

/// Complete description of a dashboard, ready for rendering
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSpec {
    pub title: String,
    pub theme: String,
    pub height: u32,
    pub vertical_spacing: f64,
    pub show_legend: bool,
    pub panels: Vec<Panel>,
}

/// Vertical spacing between panels as a fraction of the total height
///
/// `BASE_SPACING / max(1, panel_count / 2)`. The result is always within
/// `(0, BASE_SPACING]` and shrinks as panels are added.
pub fn vertical_spacing(panel_count: usize) -> f64 {
    BASE_SPACING / f64::max(1.0, panel_count as f64 / 2.0)
}

/// Overall dashboard height in pixels, linear in the panel count
pub fn dashboard_height(panel_count: usize) -> u32 {
    let panels = u32::try_from(panel_count).unwrap_or(u32::MAX);
    PANEL_HEIGHT.saturating_mul(panels)
}

/// Columns to visualize: every numeric column in original order, or all
/// columns when none is numeric.
pub fn select_columns(dataset: &Dataset) -> Vec<&Column> {
    let numeric: Vec<&Column> = dataset
        .columns()
        .iter()
        .filter(|column| column.kind() == ColumnKind::Numeric)
        .collect();

    if numeric.is_empty() {
        debug!("No numeric columns found, falling back to all columns");
        return dataset.columns().iter().collect();
    }

    numeric
}

/// Build a dashboard description for a dataset
///
/// # Arguments
/// * `dataset` - Parsed result data
/// * `source` - Identity of the result file, used in the dashboard title
///
/// # Returns
/// * `DashboardResult<DashboardSpec>` - One panel per selected column
///
/// # Errors
/// * `EmptyDataset` if the dataset has no columns
///
/// # Examples
/// ```
/// use sheetdash::dashboard::build_dashboard;
/// use sheetdash::dataset::Dataset;
///
/// let data = Dataset::from_csv_reader("time,value_a,value_b\nx,1,2\ny,3,4\n".as_bytes()).unwrap();
/// let dashboard = build_dashboard(&data, "out.csv").unwrap();
///
/// assert_eq!(dashboard.panels.len(), 2);
/// assert_eq!(dashboard.panels[0].title, "Value A");
/// assert_eq!(dashboard.height, 600);
/// ```
pub fn build_dashboard(dataset: &Dataset, source: &str) -> DashboardResult<DashboardSpec> {
    if dataset.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }

    let selected = select_columns(dataset);
    let panel_count = selected.len();
    info!("Generating {} graphs for {}", panel_count, source);

    let x: Vec<usize> = (0..dataset.row_count()).collect();

    let panels = selected
        .into_iter()
        .enumerate()
        .map(|(i, column)| {
            let title = format_title(&column.name);
            Panel {
                row: i + 1,
                column: column.name.clone(),
                title: title.clone(),
                series: LineSeries {
                    name: title,
                    x: x.clone(),
                    y: column.series(),
                },
            }
        })
        .collect();

    Ok(DashboardSpec {
        title: format!("Visualization of {}", source),
        theme: THEME.to_string(),
        height: dashboard_height(panel_count),
        vertical_spacing: vertical_spacing(panel_count),
        show_legend: false,
        panels,
    })
}

/// Parse CSV content and build its dashboard in one step
///
/// Fails with `DatasetUnreadable` before any panel is built if the content
/// cannot be parsed.
pub fn load_dashboard<R: Read>(reader: R, source: &str) -> DashboardResult<DashboardSpec> {
    let dataset = Dataset::from_csv_reader(reader)?;
    build_dashboard(&dataset, source)
}
