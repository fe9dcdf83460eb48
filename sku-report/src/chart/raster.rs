//! Software rasteriser for [`ChartSpec`]s

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::error::ReportError;

use super::{Axis, AxisSide, ChartImage, ChartRenderer, ChartSpec, SeriesKind};

/// Fonts tried when none is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: Rgb<u8> = Rgb([64, 64, 64]);
const TEXT_COLOR: Rgb<u8> = Rgb([32, 32, 32]);
const GRID_COLOR: u32 = 0xB0B0B0;
const GRID_ALPHA: f32 = 0.3;

// Logical (96 DPI) layout, scaled by dpi / 96 at draw time
const TITLE_SIZE: f32 = 14.0;
const LABEL_SIZE: f32 = 8.0;
const MARGIN_TOP: f32 = 34.0;
const MARGIN_SIDE: f32 = 62.0;
const MARGIN_RIGHT_PLAIN: f32 = 18.0;
const MARGIN_BOTTOM: f32 = 40.0;
const LINE_WIDTH: f32 = 2.5;
const MARKER_RADIUS: f32 = 3.0;
const DASH: f32 = 7.0;
const GAP: f32 = 4.0;

/// Draws charts with `imageproc`, labels with `ab_glyph`
///
/// Without a usable TrueType font only shapes are drawn.
pub struct RasterRenderer {
    font: Option<FontVec>,
}

impl RasterRenderer {
    /// Load the configured font, else the first system font found
    pub fn new(font_path: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = font_path
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
            .collect();

        for path in &candidates {
            match load_font(path) {
                Ok(font) => {
                    log::debug!("Chart font: {}", path.display());
                    return Self { font: Some(font) };
                }
                Err(e) => {
                    if Some(path.as_path()) == font_path {
                        log::warn!("Configured font {} unusable: {}", path.display(), e);
                    }
                }
            }
        }

        log::warn!("No TrueType font found; charts are rendered without labels");
        Self { font: None }
    }

    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path)?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow::anyhow!("invalid font: {}", e))
}

impl ChartRenderer for RasterRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<ChartImage, ReportError> {
        spec.validate()
            .map_err(|msg| ReportError::render(&spec.title, msg))?;

        let (width, height) = spec.size.pixels();
        let scale = spec.size.dpi as f32 / 96.0;
        let mut canvas = Canvas {
            img: RgbImage::from_pixel(width, height, WHITE),
            scale,
            font: self.font.as_ref(),
        };

        canvas.draw_chart(spec);

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(canvas.img)
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| ReportError::render(&spec.title, e))?;

        Ok(ChartImage {
            png: png.into_inner(),
            width: spec.size.width,
            height: spec.size.height,
        })
    }
}

fn rgb(hex: u32) -> Rgb<u8> {
    Rgb([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
}

/// Blend `hex` over white
fn faded(hex: u32, alpha: f32) -> Rgb<u8> {
    let Rgb(c) = rgb(hex);
    let mix = |v: u8| (v as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
    Rgb([mix(c[0]), mix(c[1]), mix(c[2])])
}

/// Pixel rectangle of the plotting area
#[derive(Debug, Clone, Copy)]
struct Plot {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Plot {
    fn width(&self) -> f32 {
        self.right - self.left
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn y_for(&self, axis: &Axis, value: f64) -> f32 {
        let span = axis.max - axis.min;
        let frac = if span > 0.0 { (value - axis.min) / span } else { 0.0 };
        self.bottom - frac.clamp(0.0, 1.0) as f32 * self.height()
    }
}

struct Canvas<'f> {
    img: RgbImage,
    scale: f32,
    font: Option<&'f FontVec>,
}

impl Canvas<'_> {
    fn px(&self, logical: f32) -> f32 {
        logical * self.scale
    }

    fn draw_chart(&mut self, spec: &ChartSpec) {
        let (w, h) = self.img.dimensions();
        let right_margin = if spec.secondary.is_some() {
            MARGIN_SIDE
        } else {
            MARGIN_RIGHT_PLAIN
        };
        let plot = Plot {
            left: self.px(MARGIN_SIDE),
            top: self.px(MARGIN_TOP),
            right: w as f32 - self.px(right_margin),
            bottom: h as f32 - self.px(MARGIN_BOTTOM),
        };
        if plot.width() < 1.0 || plot.height() < 1.0 {
            return;
        }

        self.draw_grid(&plot, &spec.primary);
        self.draw_bars(&plot, spec);
        self.draw_lines(&plot, spec);
        self.draw_axes(&plot, spec);
        self.draw_x_labels(&plot, &spec.x_labels);
        self.draw_legend(&plot, spec);

        let title_size = self.px(TITLE_SIZE);
        let title_width = self.text_width(&spec.title, title_size);
        let x = (w as f32 - title_width) / 2.0;
        self.text(&spec.title, x, self.px(8.0), title_size, rgb(spec.title_color));
    }

    fn draw_grid(&mut self, plot: &Plot, axis: &Axis) {
        let color = faded(GRID_COLOR, GRID_ALPHA);
        for tick in &axis.ticks {
            let y = plot.y_for(axis, *tick);
            draw_line_segment_mut(&mut self.img, (plot.left, y), (plot.right, y), color);
        }
    }

    fn draw_bars(&mut self, plot: &Plot, spec: &ChartSpec) {
        let bars: Vec<_> = spec
            .series
            .iter()
            .filter(|s| s.kind == SeriesKind::Bar)
            .collect();
        if bars.is_empty() {
            return;
        }

        let slot = plot.width() / spec.x_labels.len() as f32;
        let group = slot * 0.8;
        let bar_width = group / bars.len() as f32;

        for (i, series) in bars.iter().enumerate() {
            let axis = self.axis_of(spec, series.axis);
            let color = faded(series.color, series.alpha);
            let base = plot.y_for(axis, 0.0);

            for (k, value) in series.values.iter().enumerate() {
                let x = plot.left + slot * k as f32 + (slot - group) / 2.0 + bar_width * i as f32;
                let y = plot.y_for(axis, *value);
                let (top, bottom) = if y < base { (y, base) } else { (base, y) };
                let width = bar_width.max(1.0) as u32;
                let height = (bottom - top).round() as u32;
                if height == 0 {
                    continue;
                }
                draw_filled_rect_mut(
                    &mut self.img,
                    Rect::at(x.round() as i32, top.round() as i32).of_size(width, height),
                    color,
                );
            }
        }
    }

    fn draw_lines(&mut self, plot: &Plot, spec: &ChartSpec) {
        let slot = plot.width() / spec.x_labels.len() as f32;
        for series in spec.series.iter().filter(|s| s.kind == SeriesKind::Line) {
            let axis = self.axis_of(spec, series.axis);
            let color = faded(series.color, series.alpha);
            let points: Vec<(f32, f32)> = series
                .values
                .iter()
                .enumerate()
                .map(|(k, v)| (plot.left + slot * (k as f32 + 0.5), plot.y_for(axis, *v)))
                .collect();

            // a single point still gets a visible threshold line
            let points = if points.len() == 1 && series.dashed {
                vec![(plot.left, points[0].1), (plot.right, points[0].1)]
            } else {
                points
            };

            for pair in points.windows(2) {
                if series.dashed {
                    self.dashed_segment(pair[0], pair[1], color);
                } else {
                    self.thick_segment(pair[0], pair[1], color);
                }
            }

            if series.markers {
                let radius = self.px(MARKER_RADIUS).round() as i32;
                for (x, y) in &points {
                    draw_filled_circle_mut(&mut self.img, (*x as i32, *y as i32), radius, color);
                }
            }
        }
    }

    fn thick_segment(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
        let half = (self.px(LINE_WIDTH) / 2.0).round() as i32;
        for d in -half..=half {
            let d = d as f32;
            draw_line_segment_mut(&mut self.img, (from.0, from.1 + d), (to.0, to.1 + d), color);
        }
    }

    fn dashed_segment(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            return;
        }
        let (dash, gap) = (self.px(DASH), self.px(GAP));
        let mut pos = 0.0;
        while pos < length {
            let end = (pos + dash).min(length);
            let a = (from.0 + dx * pos / length, from.1 + dy * pos / length);
            let b = (from.0 + dx * end / length, from.1 + dy * end / length);
            self.thick_segment(a, b, color);
            pos = end + gap;
        }
    }

    fn draw_axes(&mut self, plot: &Plot, spec: &ChartSpec) {
        draw_line_segment_mut(
            &mut self.img,
            (plot.left, plot.bottom),
            (plot.right, plot.bottom),
            AXIS_COLOR,
        );
        draw_line_segment_mut(
            &mut self.img,
            (plot.left, plot.top),
            (plot.left, plot.bottom),
            AXIS_COLOR,
        );

        let size = self.px(LABEL_SIZE);
        let pad = self.px(4.0);
        for tick in &spec.primary.ticks {
            let label = spec.primary.format.format(*tick);
            let y = plot.y_for(&spec.primary, *tick) - size / 2.0;
            let x = plot.left - pad - self.text_width(&label, size);
            self.text(&label, x, y, size, TEXT_COLOR);
        }

        if let Some(secondary) = &spec.secondary {
            draw_line_segment_mut(
                &mut self.img,
                (plot.right, plot.top),
                (plot.right, plot.bottom),
                AXIS_COLOR,
            );
            for tick in &secondary.ticks {
                let label = secondary.format.format(*tick);
                let y = plot.y_for(secondary, *tick) - size / 2.0;
                self.text(&label, plot.right + pad, y, size, TEXT_COLOR);
            }
        }
    }

    /// Centered labels under each slot, thinned out when they would overlap
    fn draw_x_labels(&mut self, plot: &Plot, labels: &[String]) {
        if self.font.is_none() {
            return;
        }
        let size = self.px(LABEL_SIZE);
        let slot = plot.width() / labels.len() as f32;
        let widest = labels
            .iter()
            .map(|l| self.text_width(l, size))
            .fold(0.0, f32::max);
        let every = ((widest + self.px(6.0)) / slot).ceil().max(1.0) as usize;

        for (k, label) in labels.iter().enumerate().step_by(every) {
            let center = plot.left + slot * (k as f32 + 0.5);
            let x = center - self.text_width(label, size) / 2.0;
            self.text(label, x, plot.bottom + self.px(4.0), size, TEXT_COLOR);
        }
    }

    fn draw_legend(&mut self, plot: &Plot, spec: &ChartSpec) {
        let size = self.px(LABEL_SIZE);
        let swatch = self.px(9.0).round().max(1.0) as u32;
        let x = plot.left + self.px(8.0);
        let mut y = plot.top + self.px(6.0);

        for series in &spec.series {
            let color = faded(series.color, series.alpha);
            draw_filled_rect_mut(
                &mut self.img,
                Rect::at(x as i32, y as i32).of_size(swatch, swatch),
                color,
            );
            self.text(&series.name, x + swatch as f32 + self.px(4.0), y, size, TEXT_COLOR);
            y += self.px(13.0);
        }
    }

    fn axis_of<'s>(&self, spec: &'s ChartSpec, side: AxisSide) -> &'s Axis {
        match (side, &spec.secondary) {
            (AxisSide::Secondary, Some(axis)) => axis,
            _ => &spec.primary,
        }
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        match self.font {
            Some(font) if !text.is_empty() => text_size(PxScale::from(size), font, text).0 as f32,
            _ => 0.0,
        }
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgb<u8>) {
        let Some(font) = self.font else {
            return;
        };
        if text.is_empty() {
            return;
        }
        draw_text_mut(
            &mut self.img,
            color,
            x.round() as i32,
            y.round() as i32,
            PxScale::from(size),
            font,
            text,
        );
    }
}
