//! Charts, logs and terminal tables for an aggregated sweep.
//!
//! Every report writes three files sharing a base name: a PNG and an SVG of the
//! chart, and a `.log` listing every point:
//!
//! ```text
//! Threads: 1
//! No Cache Blocking: {'min': 2.5, 'max': 2.75, 'med': 2.6}
//! Block size 16: {'min': 0.5, 'max': 1.5, 'med': 0.9}
//!
//! ```
//!
//! The log is the durable record and can be read back with [`read_log`].

pub mod plot;
pub mod style;

use crate::aggregate::{Aggregation, SeriesPoint};
use crate::classifier::SeriesKey;
use crate::error::{Result, SweepError, Warning, Warnings};
use plot::Chart;
use plotters::prelude::*;
use prettytable::{row, Cell, Row, Table};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written by one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub png: PathBuf,
    pub svg: PathBuf,
    pub log: PathBuf,
    pub warnings: Warnings,
}

/// Writes reports into a results directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    results_dir: PathBuf,
    legend_table: bool,
}

impl Reporter {
    pub fn new<P: AsRef<Path>>(results_dir: P) -> Self {
        Reporter {
            results_dir: results_dir.as_ref().to_path_buf(),
            legend_table: false,
        }
    }

    /// Adds a table next to the chart decoding the layout markers.
    pub fn with_legend_table(mut self, enabled: bool) -> Self {
        self.legend_table = enabled;
        self
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Draws the chart and writes the log for `aggregation` under `output_name`.
    ///
    /// Series without a marker are left out of the chart but kept in the log.
    pub fn render(&self, aggregation: &Aggregation, output_name: &str) -> Result<ReportArtifact> {
        fs::create_dir_all(&self.results_dir).map_err(|source| SweepError::Io {
            path: self.results_dir.clone(),
            source,
        })?;

        let mut warnings = Warnings::new();
        let all_series = aggregation.series();
        let mut plotted = Vec::new();
        for (key, series) in &all_series {
            match style::style_for(key) {
                Some(style) => plotted.push((series, style)),
                None => warnings.push(Warning::MissingStyle { key: key.to_string() }),
            }
        }

        let legend = if self.legend_table {
            let keys: Vec<SeriesKey> = plotted.iter().map(|(series, _)| series.key()).collect();
            style::layout_legend(&keys)
        } else {
            Vec::new()
        };
        let chart = Chart {
            series: plotted,
            legend,
            max_threads: aggregation.max_threads(),
            global_max: aggregation.global_max(),
        };

        let png = self.results_dir.join(format!("{}.png", output_name));
        let svg = self.results_dir.join(format!("{}.svg", output_name));
        let log = self.results_dir.join(format!("{}.log", output_name));

        let size = chart.size();
        plot::draw(BitMapBackend::new(&png, size).into_drawing_area(), &chart)
            .map_err(|e| SweepError::Plot { path: png.clone(), reason: e.to_string() })?;
        plot::draw(SVGBackend::new(&svg, size).into_drawing_area(), &chart)
            .map_err(|e| SweepError::Plot { path: svg.clone(), reason: e.to_string() })?;
        write_log(aggregation, &log)?;

        info!("Wrote {}, {} and {}", png.display(), svg.display(), log.display());
        if !chart.legend.is_empty() {
            legend_table(&chart.legend).printstd();
        }
        summary_table(aggregation).printstd();

        Ok(ReportArtifact { png, svg, log, warnings })
    }
}

/// Formats a float the way the log has always printed them (`0.5`, `1.0`, `1e-05`).
///
/// The digits are the shortest that read back to the same value.
pub fn format_seconds(value: f64) -> String {
    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

fn format_point(point: &SeriesPoint) -> String {
    format!(
        "{{'min': {}, 'max': {}, 'med': {}}}",
        format_seconds(point.min),
        format_seconds(point.max),
        format_seconds(point.med)
    )
}

/// Renders the log text: one block per swept thread count, one line per series.
///
/// Thread counts that produced no series still get their header, so the log
/// records the whole sweep range.
pub fn format_log(aggregation: &Aggregation) -> String {
    let mut output = String::new();
    for threads in 1..=aggregation.max_threads() {
        // Writing to a String cannot fail
        let _ = writeln!(output, "Threads: {}", threads);
        for (key, point) in aggregation.row(threads).into_iter().flatten() {
            let _ = writeln!(output, "{}: {}", key, format_point(point));
        }
        output.push('\n');
    }
    output
}

pub fn write_log(aggregation: &Aggregation, path: &Path) -> Result<()> {
    fs::write(path, format_log(aggregation)).map_err(|source| SweepError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a log written by [`write_log`] back into a table.
///
/// The thread range is taken to end at the last `Threads:` header.
pub fn read_log(text: &str) -> Result<Aggregation> {
    let mut points = Vec::new();
    let mut current: Option<u32> = None;
    let mut last_threads = 0;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let malformed = |reason: &str| SweepError::Log { line: line_no, reason: reason.to_string() };
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(threads) = line.strip_prefix("Threads:") {
            let threads = threads.trim().parse::<u32>().map_err(|_| malformed("bad thread count"))?;
            current = Some(threads);
            last_threads = last_threads.max(threads);
            continue;
        }

        let threads = current.ok_or_else(|| malformed("entry before any 'Threads:' header"))?;
        let (key, stats) = line.split_once(": {").ok_or_else(|| malformed("expected '<series>: {...}'"))?;
        let key = key.parse::<SeriesKey>().map_err(|e| malformed(&e.to_string()))?;
        let stats = stats.strip_suffix('}').ok_or_else(|| malformed("missing closing brace"))?;

        let (mut min, mut max, mut med) = (None, None, None);
        for field in stats.split(',') {
            let (name, value) = field.split_once(':').ok_or_else(|| malformed("expected 'name': value"))?;
            let value = value.trim().parse::<f64>().map_err(|_| malformed("bad number"))?;
            match name.trim().trim_matches('\'') {
                "min" => min = Some(value),
                "max" => max = Some(value),
                "med" => med = Some(value),
                _ => return Err(malformed("unknown statistic")),
            }
        }
        let (Some(min), Some(max), Some(med)) = (min, max, med) else {
            return Err(malformed("missing statistic"));
        };

        points.push((key, SeriesPoint { threads, min, max, med }));
    }

    Ok(Aggregation::from_points(points, last_threads))
}

/// Terminal table with one row per thread count and one column per series.
pub fn summary_table(aggregation: &Aggregation) -> Table {
    let keys: Vec<SeriesKey> = aggregation.series().into_keys().collect();

    let mut table = Table::new();
    let mut header = vec![Cell::new("Threads")];
    header.extend(keys.iter().map(|key| Cell::new(&format!("{} med [min, max]", key))));
    table.add_row(Row::new(header));

    for (threads, row) in aggregation.rows() {
        let mut cells = vec![Cell::new(&threads.to_string())];
        cells.extend(keys.iter().map(|key| match row.get(key) {
            Some(p) => Cell::new(&format!("{:.4} [{:.4}, {:.4}]", p.med, p.min, p.max)),
            None => Cell::new("-"),
        }));
        table.add_row(Row::new(cells));
    }

    table
}

/// Terminal version of the legend drawn next to layout charts.
pub fn legend_table(rows: &[style::LegendRow]) -> Table {
    let [marker, a, b, c] = style::LEGEND_HEADER;
    let mut table = Table::new();
    table.add_row(row![marker, a, b, c]);
    for legend_row in rows {
        let [marker, a, b, c] = &legend_row.cells;
        table.add_row(row![marker, a, b, c]);
    }
    table
}
