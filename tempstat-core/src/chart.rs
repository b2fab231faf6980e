//! Line chart of daily max/min/avg temperatures.

use std::{
    fmt, fs,
    ops::Range,
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::{
    error::FetchError,
    model::{DATE_FORMAT, DailyRecord, WeatherSeries},
};

const SIZE: (u32, u32) = (1000, 700);
const DEFAULT_EXTENSION: &str = "png";

/// Draws a chart for a fetched series.
pub trait ChartRenderer: Send + Sync + fmt::Debug {
    fn render(&self, series: &WeatherSeries, city: &str) -> Result<Chart, FetchError>;
}

/// Renders with plotters into memory, as both an RGB bitmap and an SVG
/// document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, series: &WeatherSeries, city: &str) -> Result<Chart, FetchError> {
        Chart::render(series, city)
    }
}

/// A drawn chart. Saving writes out the drawing made at render time.
#[derive(Clone, PartialEq)]
pub struct Chart {
    title: String,
    series: WeatherSeries,
    pixels: Vec<u8>,
    svg: String,
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("title", &self.title)
            .field("days", &self.series.len())
            .field("bitmap_bytes", &self.pixels.len())
            .field("svg_bytes", &self.svg.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
    Png,
    Svg,
}

impl Chart {
    /// Draw the chart. Fails with `RenderFailed` when plotters cannot draw,
    /// e.g. when no font is available for the caption.
    pub fn render(series: &WeatherSeries, city: &str) -> Result<Self, FetchError> {
        let title = chart_title(city);

        let mut pixels = vec![0u8; (SIZE.0 * SIZE.1 * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, SIZE).into_drawing_area();
            draw(series, &title, root).map_err(FetchError::RenderFailed)?;
        }

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
            draw(series, &title, root).map_err(FetchError::RenderFailed)?;
        }

        tracing::debug!(%title, days = series.len(), "rendered chart");
        Ok(Self {
            title,
            series: series.clone(),
            pixels,
            svg,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn series(&self) -> &WeatherSeries {
        &self.series
    }

    /// Save as SVG when the path ends in `.svg`, PNG otherwise. A path
    /// without extension gets `.png` appended. Returns the path written.
    pub fn save_image(&self, path: &Path) -> Result<PathBuf, FetchError> {
        let path = if path.extension().is_none() {
            path.with_extension(DEFAULT_EXTENSION)
        } else {
            path.to_path_buf()
        };

        // The bitmap encoder only reports a bad destination at present().
        let missing_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty() && !p.is_dir());
        if let Some(parent) = missing_dir {
            return Err(FetchError::io(
                &path,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                ),
            ));
        }

        match image_format(&path) {
            ImageFormat::Svg => fs::write(&path, &self.svg).map_err(|e| FetchError::io(&path, e))?,
            ImageFormat::Png => {
                let to_io = |msg: String| FetchError::io(&path, std::io::Error::other(msg));
                let mut backend = BitMapBackend::new(&path, SIZE);
                backend
                    .blit_bitmap((0, 0), SIZE, &self.pixels)
                    .map_err(|e| to_io(e.to_string()))?;
                backend.present().map_err(|e| to_io(e.to_string()))?;
            }
        }

        tracing::info!(path = %path.display(), "saved chart");
        Ok(path)
    }

    #[cfg(test)]
    pub(crate) fn blank(series: &WeatherSeries, city: &str) -> Self {
        Self {
            title: chart_title(city),
            series: series.clone(),
            pixels: vec![255u8; (SIZE.0 * SIZE.1 * 3) as usize],
            svg: format!("<svg><text>{}</text></svg>", chart_title(city)),
        }
    }
}

fn chart_title(city: &str) -> String {
    format!("Temperature Trends: {city}")
}

/// Date axis; a single day is widened to one day so the axis is not empty.
fn x_range(series: &WeatherSeries) -> Range<NaiveDate> {
    let first = series.first_date();
    let last = series.last_date();
    if first == last {
        first..first + Duration::days(1)
    } else {
        first..last
    }
}

/// Temperature axis, padded by one degree on each side.
fn y_range(series: &WeatherSeries) -> Range<f64> {
    let lo = series
        .iter()
        .map(|r| r.min_temp)
        .fold(f64::INFINITY, f64::min);
    let hi = series
        .iter()
        .map(|r| r.max_temp)
        .fold(f64::NEG_INFINITY, f64::max);
    (lo - 1.0)..(hi + 1.0)
}

fn draw<DB>(series: &WeatherSeries, title: &str, root: DrawingArea<DB, Shift>) -> Result<(), String>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let err = |e: DrawingAreaErrorKind<DB::ErrorType>| e.to_string();

    root.fill(&WHITE).map_err(err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range(series), y_range(series))
        .map_err(err)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Temp (°C)")
        .x_label_formatter(&|d: &NaiveDate| d.format(DATE_FORMAT).to_string())
        .draw()
        .map_err(err)?;

    let lines: [(&str, RGBColor, fn(&DailyRecord) -> f64); 3] = [
        ("Max Temp", RED, |r| r.max_temp),
        ("Min Temp", BLUE, |r| r.min_temp),
        ("Avg Temp", GREEN, |r| r.avg_temp),
    ];

    for (label, color, value) in lines {
        let points: Vec<(NaiveDate, f64)> = series.iter().map(|r| (r.date, value(r))).collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .map_err(err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(err)?;

    root.present().map_err(err)?;
    Ok(())
}

fn image_format(path: &Path) -> ImageFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageFormat::Svg,
        _ => ImageFormat::Png,
    }
}
