use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, info};

use super::{format_percentage, PieChart, RenderError, Wedge};

/// Fraction of the radius where percentage labels sit.
const PCT_DISTANCE: f64 = 0.6;
/// Fraction of the radius where slice names sit.
const LABEL_DISTANCE: f64 = 1.1;
/// Arc resolution in degrees.
const ARC_STEP_DEG: f64 = 1.0;

/// Geometry of the composite figure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FigureConfig {
    /// Figure width in inches.
    pub width_in: f64,
    /// Figure height in inches.
    pub height_in: f64,
    /// Raster resolution.
    pub dpi: u32,
    /// Radial offset of every wedge, as a fraction of the radius.
    pub explode: f64,
    /// Angle of the first wedge's leading edge, in degrees.
    pub start_angle: f64,
    /// Title font size in points.
    pub title_pt: f64,
    /// Slice label font size in points.
    pub label_pt: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: 25.0,
            height_in: 5.0,
            dpi: 300,
            explode: 0.02,
            start_angle: 140.0,
            title_pt: 14.0,
            label_pt: 10.0,
        }
    }
}

impl FigureConfig {
    /// Canvas size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    fn points_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.0
    }
}

/// Image encoding chosen from the output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raster image; the encoder follows the extension (PNG when there is none).
    Bitmap,
    /// Scalable vector graphics.
    Svg,
}

impl OutputFormat {
    /// `.svg` (case-insensitive) selects SVG; everything else is a bitmap.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Self::Svg,
            _ => Self::Bitmap,
        }
    }
}

/// Draw `charts` side by side and write the figure to `path`.
///
/// The figure is drawn and encoded in memory; `path` is only touched once the
/// whole image is ready.
pub fn render_figure<P: AsRef<Path>>(
    charts: &[PieChart],
    path: P,
    config: &FigureConfig,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    let size = config.pixel_size();
    let format = OutputFormat::from_path(path);

    let written = match format {
        OutputFormat::Svg => render_svg(charts, size, config),
        OutputFormat::Bitmap => render_bitmap(charts, size, config, path),
    }
    .and_then(|bytes| fs::write(path, bytes).map_err(|e| e.to_string()));

    written.map_err(|message| RenderError::OutputWrite {
        path: path.display().to_string(),
        message,
    })?;

    info!(path = %path.display(), ?format, width = size.0, height = size.1, "wrote chart figure");
    Ok(())
}

fn render_svg(
    charts: &[PieChart],
    size: (u32, u32),
    config: &FigureConfig,
) -> Result<Vec<u8>, String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(&root, charts, config)
            .and_then(|_| root.present())
            .map_err(|e| e.to_string())?;
    }
    Ok(svg.into_bytes())
}

fn render_bitmap(
    charts: &[PieChart],
    size: (u32, u32),
    config: &FigureConfig,
    path: &Path,
) -> Result<Vec<u8>, String> {
    // Extension-less outputs are PNG.
    let image_format = match path.extension() {
        None => ImageFormat::Png,
        Some(_) => ImageFormat::from_path(path).map_err(|e| e.to_string())?,
    };

    let (width, height) = size;
    let mut canvas = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut canvas, size).into_drawing_area();
        draw_figure(&root, charts, config)
            .and_then(|_| root.present())
            .map_err(|e| e.to_string())?;
    }

    let image = RgbImage::from_raw(width, height, canvas)
        .ok_or_else(|| format!("canvas does not match {width}x{height} pixels"))?;
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, image_format)
        .map_err(|e| e.to_string())?;
    Ok(encoded.into_inner())
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    charts: &[PieChart],
    config: &FigureConfig,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    if charts.is_empty() {
        return Ok(());
    }

    let panels = root.split_evenly((1, charts.len()));
    for (chart, panel) in charts.iter().zip(panels.iter()) {
        draw_pie(panel, chart, config)?;
    }
    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &PieChart,
    config: &FigureConfig,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (width, height) = area.dim_in_pixel();
    let title_px = config.points_to_px(config.title_pt);
    let label_px = config.points_to_px(config.label_pt);

    let title_style = TextStyle::from(
        ("monospace", title_px)
            .into_font()
            .style(FontStyle::Bold),
    )
    .color(&BLACK)
    .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        chart.title.clone(),
        ((width / 2) as i32, (title_px * 1.2) as i32),
        title_style,
    ))?;

    let top = title_px * 2.4;
    let plot_height = (height as f64 - top).max(0.0);
    let center = (width as f64 / 2.0, top + plot_height / 2.0);
    // Room for the outside labels.
    let radius = 0.35 * (width as f64).min(plot_height);

    let label_style = TextStyle::from(("sans-serif", label_px).into_font()).color(&BLACK);

    let wedges = chart.wedges(config.start_angle);
    let Some(percentages) = chart.percentages() else {
        debug!(title = %chart.title, "chart total is zero; drawing placeholder");
        area.draw(&Circle::new(
            to_px(center),
            radius as i32,
            BLACK.stroke_width(2),
        ))?;
        area.draw(&Text::new(
            "no data",
            to_px(center),
            label_style.pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
        return Ok(());
    };

    debug!(title = %chart.title, slices = chart.slices.len(), total = %chart.total(), "drawing chart");
    for ((slice, wedge), pct) in chart.slices.iter().zip(&wedges).zip(&percentages) {
        let offset = polar(center, config.explode * radius, wedge.mid_deg());
        area.draw(&Polygon::new(
            wedge_outline(offset, radius, wedge),
            slice.color.filled(),
        ))?;

        area.draw(&Text::new(
            format_percentage(*pct),
            to_px(polar(offset, PCT_DISTANCE * radius, wedge.mid_deg())),
            label_style.pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;

        // Names hang away from the pie, like a legend pinned to each wedge.
        let label_pos = polar(offset, LABEL_DISTANCE * radius, wedge.mid_deg());
        let h_pos = if label_pos.0 >= offset.0 {
            HPos::Left
        } else {
            HPos::Right
        };
        area.draw(&Text::new(
            slice.label.clone(),
            to_px(label_pos),
            label_style.pos(Pos::new(h_pos, VPos::Center)),
        ))?;
    }

    Ok(())
}

/// Point at `radius` and `deg` (counter-clockwise, y axis pointing down).
fn polar(center: (f64, f64), radius: f64, deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (center.0 + radius * rad.cos(), center.1 - radius * rad.sin())
}

fn to_px(point: (f64, f64)) -> (i32, i32) {
    (point.0.round() as i32, point.1.round() as i32)
}

/// Closed outline of a wedge: apex followed by the arc.
fn wedge_outline(center: (f64, f64), radius: f64, wedge: &Wedge) -> Vec<(i32, i32)> {
    let steps = (wedge.sweep_deg() / ARC_STEP_DEG).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(to_px(center));
    for step in 0..=steps {
        let deg = wedge.start_deg + wedge.sweep_deg() * step as f64 / steps as f64;
        points.push(to_px(polar(center, radius, deg)));
    }
    points
}
