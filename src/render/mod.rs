//! Pie-chart descriptions and their rendering.
//!
//! A [`PieChart`] is plain data: a title and ordered, coloured slices. The
//! geometry (wedge angles, percentages) is computed here so that it can be
//! checked without a drawing backend; [`render_figure`] then lays the charts
//! side by side and hands them to `plotters`.

mod figure;

pub use figure::{render_figure, FigureConfig, OutputFormat};

use plotters::style::RGBColor;
use thiserror::Error;

/// Slice colours, assigned in slice order.
pub const PALETTE: [RGBColor; 7] = [
    RGBColor(0xff, 0x99, 0x99),
    RGBColor(0x66, 0xb3, 0xff),
    RGBColor(0x99, 0xff, 0x99),
    RGBColor(0xff, 0xcc, 0x99),
    RGBColor(0xc2, 0xc2, 0xf0),
    RGBColor(0xff, 0xb3, 0xe6),
    RGBColor(0xc4, 0xe1, 0x7f),
];

/// Errors raised while producing the output image.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Drawing or encoding the image at `path` failed.
    #[error("failed to write chart image {path}: {message}")]
    OutputWrite {
        /// Output path as given.
        path: String,
        /// Backend diagnostic.
        message: String,
    },
}

/// One labelled slice of a pie.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Legend text drawn next to the wedge.
    pub label: String,
    /// Raw count.
    pub value: u64,
    /// Fill colour.
    pub color: RGBColor,
}

impl Slice {
    /// Construct a slice.
    pub fn new(label: impl Into<String>, value: u64, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            value,
            color,
        }
    }
}

/// Angular extent of a slice, in degrees counter-clockwise from the +x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    /// Angle where the wedge begins.
    pub start_deg: f64,
    /// Angle where the wedge ends (`>= start_deg`).
    pub end_deg: f64,
    /// Share of the chart total, in `[0, 1]`.
    pub fraction: f64,
}

impl Wedge {
    /// Bisecting angle, used to place labels and explode the wedge.
    pub fn mid_deg(&self) -> f64 {
        (self.start_deg + self.end_deg) / 2.0
    }

    /// Angular width.
    pub fn sweep_deg(&self) -> f64 {
        self.end_deg - self.start_deg
    }
}

/// A titled pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    /// Caption above the pie.
    pub title: String,
    /// Slices in drawing order.
    pub slices: Vec<Slice>,
}

impl PieChart {
    /// Construct a chart.
    pub fn new(title: impl Into<String>, slices: Vec<Slice>) -> Self {
        Self {
            title: title.into(),
            slices,
        }
    }

    /// Sum of all slice values, widened so that large counts cannot wrap.
    pub fn total(&self) -> u128 {
        self.slices.iter().map(|s| u128::from(s.value)).sum()
    }

    /// Percentage of the total carried by each slice.
    ///
    /// `None` when the chart total is zero.
    pub fn percentages(&self) -> Option<Vec<f64>> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(
            self.slices
                .iter()
                .map(|s| s.value as f64 * 100.0 / total as f64)
                .collect(),
        )
    }

    /// Wedges laid out counter-clockwise from `start_deg`, one per slice.
    ///
    /// Empty when the chart total is zero.
    pub fn wedges(&self, start_deg: f64) -> Vec<Wedge> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }

        let mut angle = start_deg;
        self.slices
            .iter()
            .map(|s| {
                let fraction = s.value as f64 / total as f64;
                let wedge = Wedge {
                    start_deg: angle,
                    end_deg: angle + fraction * 360.0,
                    fraction,
                };
                angle = wedge.end_deg;
                wedge
            })
            .collect()
    }
}

/// Format a percentage with one decimal, e.g. `37.5%`.
pub fn format_percentage(pct: f64) -> String {
    format!("{pct:.1}%")
}
