// Pie chart rendering for chartable questions.
//
// The geometry (wedge angles, colors, which percentage labels to show) is
// computed by `wedge_layout` as plain data, and a plotters bitmap backend
// turns it into an in-memory RGB image that the document embeds.

use std::f64::consts::PI;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::{Polygon, Rectangle, Text};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::ReportError;
use crate::tally::ValueCounts;

/// Wedge fill colors, cycled by wedge index.
pub const WEDGE_COLORS: [(u8, u8, u8); 10] = [
    (139, 92, 246),
    (236, 72, 153),
    (16, 185, 129),
    (245, 158, 11),
    (59, 130, 246),
    (217, 70, 239),
    (110, 231, 183),
    (252, 211, 77),
    (99, 102, 241),
    (244, 114, 182),
];

const TITLE_COLOR: RGBColor = RGBColor(31, 41, 55);

/// A rendered chart: tightly packed 8-bit RGB rows.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Produces the chart image for one question. Injected into the driver so
/// report assembly can be tested without a drawing backend.
pub trait ChartRenderer {
    fn render_pie(&self, counts: &ValueCounts) -> Result<RasterImage, ReportError>;
}

/// One pie wedge. Angles are in radians from 12 o'clock, running clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct WedgeSpec {
    pub start: f64,
    pub sweep: f64,
    pub color: (u8, u8, u8),
    pub percent: f64,
    /// Slivers of 3% or less do not get a percentage label.
    pub show_percent: bool,
}

/// Turns frequencies into wedge geometry. Pure arithmetic, no drawing.
pub fn wedge_layout(counts: &ValueCounts) -> Vec<WedgeSpec> {
    let total = counts.total as f64;
    let mut start = 0.0;
    counts
        .entries
        .iter()
        .enumerate()
        .map(|(index, (_, count))| {
            let fraction = *count as f64 / total;
            let percent = fraction * 100.0;
            let wedge = WedgeSpec {
                start,
                sweep: fraction * 2.0 * PI,
                color: WEDGE_COLORS[index % WEDGE_COLORS.len()],
                percent,
                show_percent: percent > 3.0,
            };
            start += wedge.sweep;
            wedge
        })
        .collect()
}

/// The plotters-backed renderer. The canvas keeps a fixed 10:6 aspect ratio
/// so the image embeds at a known print width.
pub struct PieChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PieChartRenderer {
    fn default() -> PieChartRenderer {
        PieChartRenderer {
            width: 1000,
            height: 600,
        }
    }
}

fn draw_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> ReportError {
    ReportError::Chart(e.to_string())
}

impl PieChartRenderer {
    fn draw(
        &self,
        root: &DrawingArea<BitMapBackend, Shift>,
        counts: &ValueCounts,
    ) -> Result<(), ReportError> {
        root.fill(&WHITE).map_err(draw_error)?;

        let center = (310i32, 330i32);
        let radius = 230.0f64;
        let wedges = wedge_layout(counts);

        for wedge in &wedges {
            // Sample the arc finely enough that the rim looks round.
            let steps = ((wedge.sweep / 0.02).ceil() as usize).max(2);
            let mut points: Vec<(i32, i32)> = Vec::with_capacity(steps + 2);
            points.push(center);
            for step in 0..=steps {
                let angle = wedge.start + wedge.sweep * step as f64 / steps as f64;
                points.push((
                    center.0 + (radius * angle.sin()).round() as i32,
                    center.1 - (radius * angle.cos()).round() as i32,
                ));
            }
            let (r, g, b) = wedge.color;
            root.draw(&Polygon::new(points, RGBColor(r, g, b).filled()))
                .map_err(draw_error)?;

            if wedge.show_percent {
                let mid = wedge.start + wedge.sweep / 2.0;
                let label_at = (
                    center.0 + (radius * 0.85 * mid.sin()).round() as i32,
                    center.1 - (radius * 0.85 * mid.cos()).round() as i32,
                );
                let style = ("sans-serif", 22)
                    .into_font()
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                root.draw(&Text::new(
                    format!("{:.1}%", wedge.percent),
                    label_at,
                    style,
                ))
                .map_err(draw_error)?;
            }
        }

        let title_style = ("sans-serif", 26)
            .into_font()
            .color(&TITLE_COLOR)
            .pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(
            format!("Responses: {}", counts.total),
            (center.0, 30),
            title_style,
        ))
        .map_err(draw_error)?;

        // Legend column on the right: swatch plus "answer: count".
        let legend_x = 620i32;
        let mut legend_y = 60i32;
        for (index, (label, count)) in counts.entries.iter().enumerate() {
            if legend_y + 24 > self.height as i32 {
                break;
            }
            let (r, g, b) = WEDGE_COLORS[index % WEDGE_COLORS.len()];
            root.draw(&Rectangle::new(
                [(legend_x, legend_y), (legend_x + 16, legend_y + 16)],
                RGBColor(r, g, b).filled(),
            ))
            .map_err(draw_error)?;
            let style = ("sans-serif", 18).into_font().color(&BLACK);
            root.draw(&Text::new(
                format!("{}: {}", label, count),
                (legend_x + 24, legend_y + 1),
                style,
            ))
            .map_err(draw_error)?;
            legend_y += 25;
        }

        root.present().map_err(|e| ReportError::Chart(e.to_string()))
    }
}

impl ChartRenderer for PieChartRenderer {
    fn render_pie(&self, counts: &ValueCounts) -> Result<RasterImage, ReportError> {
        let mut pixels = vec![255u8; (self.width * self.height * 3) as usize];
        {
            let root =
                BitMapBackend::with_buffer(&mut pixels, (self.width, self.height))
                    .into_drawing_area();
            self.draw(&root, counts)?;
        }
        Ok(RasterImage {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}
