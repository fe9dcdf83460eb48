//! Chart descriptions and rendering to PNG
//!
//! Builders turn table data into a [`ChartSpec`]; a [`ChartRenderer`] turns a
//! spec into PNG bytes. The report only ever sees the resulting
//! [`ChartImage`].

mod builders;
mod raster;

pub use builders::{
    SkuChartColumns, YearSeries, comparison_chart, revenue_chart, tacos_chart, year_series,
};
pub use raster::RasterRenderer;

use crate::error::ReportError;

pub const NAVY: u32 = 0x1F4E78;
pub const RED: u32 = 0xC00000;
pub const AMBER: u32 = 0xFFC000;
pub const BLACK: u32 = 0x000000;

/// Opacity of bar fills
pub const BAR_ALPHA: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Primary,
    Secondary,
}

/// One data series, one value per x label
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    pub color: u32,
    pub alpha: f32,
    pub dashed: bool,
    pub markers: bool,
    pub axis: AxisSide,
    pub values: Vec<f64>,
}

impl Series {
    pub fn bar(name: impl Into<String>, color: u32, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Bar,
            color,
            alpha: BAR_ALPHA,
            dashed: false,
            markers: false,
            axis: AxisSide::Primary,
            values,
        }
    }

    pub fn line(name: impl Into<String>, color: u32, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: SeriesKind::Line,
            color,
            alpha: 1.0,
            dashed: false,
            markers: false,
            axis: AxisSide::Primary,
            values,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }

    pub fn on_secondary(mut self) -> Self {
        self.axis = AxisSide::Secondary;
        self
    }
}

/// How tick values are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFormat {
    /// `$1,234`
    Currency,
    /// `30%` from a fraction
    Percent,
    /// `1,234`
    Thousands,
}

impl TickFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Currency => format!("${}", thousands(value)),
            TickFormat::Percent => format!("{:.0}%", value * 100.0),
            TickFormat::Thousands => thousands(value),
        }
    }
}

/// Round to a whole number and group digits by thousands
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as i64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Value axis: range, tick positions and label format
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<f64>,
    pub format: TickFormat,
}

impl Axis {
    pub fn new(label: impl Into<String>, max: f64, ticks: Vec<f64>, format: TickFormat) -> Self {
        Self {
            label: label.into(),
            min: 0.0,
            max,
            ticks,
            format,
        }
    }

    /// Axis from zero to a rounded-up maximum, five ticks
    pub fn auto(label: impl Into<String>, data_max: f64, format: TickFormat) -> Self {
        let top = nice_ceiling(data_max);
        let ticks = (0..5).map(|i| i as f64 * top / 4.0).collect();
        Self::new(label, top, ticks, format)
    }
}

/// Smallest "nice" value (1, 2, 2.5 or 5 times a power of ten, times four
/// ticks) that covers `value`
fn nice_ceiling(value: f64) -> f64 {
    if !(value > 0.0) || !value.is_finite() {
        return 1.0;
    }
    let raw_step = value / 4.0;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude);
    step * 4.0
}

/// Logical display size of a chart and the DPI it is rasterised at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
}

impl ChartSize {
    /// Raster dimensions: logical size scaled from 96 DPI
    pub fn pixels(&self) -> (u32, u32) {
        let scale = self.dpi as f64 / 96.0;
        (
            (self.width as f64 * scale).round() as u32,
            (self.height as f64 * scale).round() as u32,
        )
    }
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub title_color: u32,
    pub x_labels: Vec<String>,
    pub series: Vec<Series>,
    pub primary: Axis,
    pub secondary: Option<Axis>,
    pub size: ChartSize,
}

impl ChartSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.x_labels.is_empty() {
            return Err("no data points".to_string());
        }
        if self.series.is_empty() {
            return Err("no series".to_string());
        }
        if let Some(bad) = self.series.iter().find(|s| s.values.len() != self.x_labels.len()) {
            return Err(format!(
                "series '{}' has {} values for {} labels",
                bad.name,
                bad.values.len(),
                self.x_labels.len()
            ));
        }
        if self.size.width == 0 || self.size.height == 0 || self.size.dpi == 0 {
            return Err("empty chart size".to_string());
        }
        Ok(())
    }
}

/// Encoded chart plus the size it should be displayed at in the sheet
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<ChartImage, ReportError>;
}
