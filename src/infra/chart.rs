use once_cell::sync::OnceCell;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::analysis::report::format_amount;
use crate::analysis::ChartSpec;
use crate::config::ChartConfig;
use crate::error::{Result, SurveyError};

const FONT_FAMILY: &str = "sans-serif";

/// Searched in order when no font is configured
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// The font registry is process-wide, so registration happens at most once
static FONT_LOADED: OnceCell<bool> = OnceCell::new();

fn register_font_from(path: &Path) -> bool {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Font not readable");
            return false;
        }
    };
    // plotters keeps a reference to the font data for the life of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            info!(path = %path.display(), "Registered chart font");
            true
        }
        Err(_) => {
            warn!(path = %path.display(), "File is not a usable font");
            false
        }
    }
}

fn ensure_font(configured: Option<&Path>) -> bool {
    *FONT_LOADED.get_or_init(|| {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
        for candidate in candidates {
            if candidate.is_file() && register_font_from(&candidate) {
                return true;
            }
        }
        warn!("No font found; charts will be drawn without labels");
        false
    })
}

/// Renders [`ChartSpec`] bar charts to PNG files.
pub struct BarChartRenderer {
    width: u32,
    height: u32,
    font_path: Option<PathBuf>,
}

impl BarChartRenderer {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            font_path: config.font_path.clone(),
        }
    }

    pub fn render(&self, spec: &ChartSpec, path: &Path) -> Result<()> {
        if spec.bars.is_empty() {
            return Err(SurveyError::Chart("nothing to plot".to_string()));
        }
        let with_text = ensure_font(self.font_path.as_deref());
        let chart_err = |e: &dyn std::fmt::Display| SurveyError::Chart(e.to_string());

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| chart_err(&e))?;

        let labels: Vec<&str> = spec.bars.iter().map(|(label, _)| label.as_str()).collect();
        let peak = spec.bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let y_max = if peak > 0.0 { peak * 1.1 } else { 1.0 };

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if with_text {
            builder
                .caption(&spec.title, (FONT_FAMILY, 26))
                .x_label_area_size(70)
                .y_label_area_size(110);
        }
        let mut chart = builder
            .build_cartesian_2d((0..labels.len()).into_segmented(), 0.0..y_max)
            .map_err(|e| chart_err(&e))?;

        if with_text {
            let x_label = |value: &SegmentValue<usize>| match value {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    labels.get(*i).map(|s| s.to_string()).unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            };
            let y_label = |value: &f64| format_amount(*value);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(labels.len())
                .x_label_formatter(&x_label)
                .y_label_formatter(&y_label)
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .draw()
                .map_err(|e| chart_err(&e))?;
        }

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.mix(0.7).filled())
                    .margin(6)
                    .data(spec.bars.iter().enumerate().map(|(i, (_, v))| (i, *v))),
            )
            .map_err(|e| chart_err(&e))?;

        root.present().map_err(|e| chart_err(&e))?;
        debug!(path = %path.display(), bars = labels.len(), "Chart written");
        Ok(())
    }
}
