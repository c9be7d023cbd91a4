#![cfg(feature = "charts")]
use image::{ImageOutputFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;

use crate::error::ChartError;
use crate::stats::ChartSeries;

/// Chart styles used by the dashboards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphType {
    /// One bar per label
    #[default]
    Bar,
    /// Points joined in label order
    Line,
}

#[derive(Clone, Debug)]
pub struct ChartOptions {
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub graph_type: GraphType,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            x_label: String::new(),
            y_label: String::new(),
            width: 800,
            height: 600,
            graph_type: GraphType::Bar,
        }
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Renders a series to PNG bytes.
///
/// # Examples
/// ```
/// use shoegrid::chart::{ChartOptions, render};
/// use shoegrid::stats::{MonthlyRevenue, monthly_series};
///
/// let series = monthly_series(2024, &[MonthlyRevenue { month: 2, amount: 40.0 }]);
/// let png = render(&series, &ChartOptions::default()).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
pub fn render(series: &ChartSeries, options: &ChartOptions) -> Result<Vec<u8>, ChartError> {
    if series.values.is_empty() {
        return Err(ChartError::Empty);
    }
    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let count = series.values.len() as i32;
        let max_y = series.values.iter().cloned().fold(0.0_f64, f64::max);
        let y_top = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(&series.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-1..count, 0.0..y_top)
            .map_err(draw_err)?;

        let labels = &series.labels;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(series.values.len() + 2)
            .x_label_formatter(&|x| {
                usize::try_from(*x)
                    .ok()
                    .and_then(|i| labels.get(i).cloned())
                    .unwrap_or_default()
            })
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()
            .map_err(draw_err)?;

        let points = series.values.iter().enumerate().map(|(i, v)| (i as i32, *v));
        match options.graph_type {
            GraphType::Bar => {
                chart
                    .draw_series(points.map(|(x, y)| {
                        let mut bar = Rectangle::new([(x, 0.0), (x + 1, y)], BLUE.filled());
                        bar.set_margin(0, 0, 8, 8);
                        bar
                    }))
                    .map_err(draw_err)?;
            }
            GraphType::Line => {
                chart
                    .draw_series(LineSeries::new(points.clone(), &BLUE))
                    .map_err(draw_err)?;
                chart
                    .draw_series(points.map(|p| Circle::new(p, 4, BLUE.filled())))
                    .map_err(draw_err)?;
            }
        }

        root.present().map_err(draw_err)?;
    }

    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| ChartError::Encode("buffer size does not match dimensions".to_string()))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageOutputFormat::Png)
        .map_err(|e| ChartError::Encode(e.to_string()))?;
    Ok(png.into_inner())
}
