//! Parser for the timing lines printed by the benchmarks.
//!
//! Each result is printed on its own line as
//!
//! ```text
//! Cache Blocked ij32, Min: 0.081s, Max: 0.102s, Med: 0.088s
//! ```
//!
//! The statistics may come in any order and any of them may be missing. Everything
//! before the first statistic is the measurement name, which may itself contain commas.

use crate::error::{Result, SweepError, Warning, Warnings};
use std::collections::BTreeMap;

/// One named timing, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub med: Option<f64>,
}

impl Measurement {
    pub fn new(name: impl Into<String>, min: f64, max: f64, med: f64) -> Self {
        Measurement {
            name: name.into(),
            min: Some(min),
            max: Some(max),
            med: Some(med),
        }
    }

    /// Returns `(min, max, med)` when all three statistics are present.
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((self.min?, self.max?, self.med?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stat {
    Min,
    Max,
    Med,
}

impl Stat {
    const ALL: [Stat; 3] = [Stat::Min, Stat::Max, Stat::Med];

    fn label(self) -> &'static str {
        match self {
            Stat::Min => "Min",
            Stat::Max => "Max",
            Stat::Med => "Med",
        }
    }

    /// Matches `<label> :` at the start of `text` and returns the statistic and what
    /// follows the colon.
    fn strip(text: &str) -> Option<(Stat, &str)> {
        Stat::ALL.into_iter().find_map(|stat| {
            let rest = text.strip_prefix(stat.label())?.trim_start();
            rest.strip_prefix(':').map(|value| (stat, value))
        })
    }
}

/// Output of one benchmark run after parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    pub measurements: BTreeMap<String, Measurement>,
    /// Lines that passed the prefix filter but carried no statistic.
    pub unknown_lines: Vec<String>,
}

/// Line-oriented parser, optionally restricted to lines with given prefixes.
#[derive(Debug, Clone, Default)]
pub struct OutputParser {
    prefixes: Vec<String>,
}

impl OutputParser {
    /// Parser that treats every non-blank line as a data line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that only looks at lines starting with one of `prefixes`.
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutputParser {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    fn accepts(&self, line: &str) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    /// Parses a whole run's standard output.
    pub fn parse(&self, text: &str) -> Result<ParsedOutput> {
        let mut output = ParsedOutput::default();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || !self.accepts(line) {
                continue;
            }
            match parse_line(line, index + 1)? {
                Some(measurement) => {
                    output.measurements.insert(measurement.name.clone(), measurement);
                }
                None => output.unknown_lines.push(line.to_string()),
            }
        }

        Ok(output)
    }
}

/// Byte offset of the first statistic field in `line`.
fn first_stat(line: &str) -> Option<usize> {
    line.char_indices().map(|(i, _)| i).find(|&i| {
        let at_boundary = line[..i]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || matches!(c, ',' | ':' | '['));
        at_boundary && Stat::strip(&line[i..]).is_some()
    })
}

/// Parses one line, returning `None` when it carries no statistic.
fn parse_line(line: &str, line_no: usize) -> Result<Option<Measurement>> {
    let Some(start) = first_stat(line) else {
        return Ok(None);
    };

    let name = line[..start]
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '['))
        .trim_start();
    let mut measurement = Measurement {
        name: name.to_string(),
        min: None,
        max: None,
        med: None,
    };

    let fields = line[start..].trim_end().trim_end_matches(']');
    for field in fields.split(',') {
        let Some((stat, value)) = Stat::strip(field.trim()) else {
            continue;
        };
        let seconds = parse_seconds(value, stat, line_no)?;
        match stat {
            Stat::Min => measurement.min = Some(seconds),
            Stat::Max => measurement.max = Some(seconds),
            Stat::Med => measurement.med = Some(seconds),
        }
    }

    Ok(Some(measurement))
}

/// Converts `"0.25s"` to `0.25`. Anything that is not a finite number is an error.
fn parse_seconds(value: &str, stat: Stat, line_no: usize) -> Result<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('s').unwrap_or(trimmed).trim_end();
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SweepError::Parse {
            line: line_no,
            field: stat.label(),
            text: trimmed.to_string(),
        })
}

/// Parsed results of a whole sweep: thread count, then measurement name.
#[derive(Debug, Clone, Default)]
pub struct ParsedSweep {
    points: BTreeMap<u32, BTreeMap<String, Measurement>>,
    warnings: Warnings,
}

impl ParsedSweep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warnings(warnings: Warnings) -> Self {
        ParsedSweep {
            points: BTreeMap::new(),
            warnings,
        }
    }

    /// Parses the output of the run at `threads` and records it.
    pub fn insert(&mut self, threads: u32, stdout: &str, parser: &OutputParser) -> Result<()> {
        let output = parser.parse(stdout)?;
        for line in output.unknown_lines {
            self.warnings.push(Warning::UnknownLine { threads, line });
        }
        self.points.insert(threads, output.measurements);
        Ok(())
    }

    /// Records measurements that were already parsed.
    pub fn insert_measurements(&mut self, threads: u32, measurements: BTreeMap<String, Measurement>) {
        self.points.insert(threads, measurements);
    }

    /// Iterates over thread counts in increasing order.
    pub fn points(&self) -> impl Iterator<Item = (u32, &BTreeMap<String, Measurement>)> {
        self.points.iter().map(|(threads, m)| (*threads, m))
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn into_parts(self) -> (BTreeMap<u32, BTreeMap<String, Measurement>>, Warnings) {
        (self.points, self.warnings)
    }
}
