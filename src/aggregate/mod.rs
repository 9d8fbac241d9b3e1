use crate::classifier::{SeriesKey, Unrecognized};
use crate::error::{Warning, Warnings};
use crate::parser::ParsedSweep;
use std::collections::BTreeMap;

/// One measurement placed at the thread count it was taken with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub threads: u32,
    pub min: f64,
    pub max: f64,
    pub med: f64,
}

/// The history of one benchmark variant, in increasing thread count.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: SeriesKey,
    points: Vec<SeriesPoint>,
}

impl Series {
    pub fn key(&self) -> SeriesKey {
        self.key
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Measurements of a sweep arranged as thread count × series key.
///
/// Both levels are ordered maps, so walking the table always visits thread counts in
/// increasing order and, within one thread count, series in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    table: BTreeMap<u32, BTreeMap<SeriesKey, SeriesPoint>>,
    global_max: f64,
    max_threads: u32,
    warnings: Warnings,
}

impl Aggregation {
    /// Builds a table directly from points, e.g. when reading a log back.
    pub fn from_points<I>(points: I, max_threads: u32) -> Self
    where
        I: IntoIterator<Item = (SeriesKey, SeriesPoint)>,
    {
        let mut aggregation = Aggregation {
            max_threads,
            ..Aggregation::default()
        };
        for (key, point) in points {
            aggregation.insert(key, point);
        }
        aggregation
    }

    fn insert(&mut self, key: SeriesKey, point: SeriesPoint) {
        self.global_max = self.global_max.max(point.max);
        self.max_threads = self.max_threads.max(point.threads);
        self.table.entry(point.threads).or_default().insert(key, point);
    }

    fn contains(&self, threads: u32, key: &SeriesKey) -> bool {
        self.table.get(&threads).is_some_and(|row| row.contains_key(key))
    }

    /// Points recorded at `threads`, if any.
    pub fn row(&self, threads: u32) -> Option<&BTreeMap<SeriesKey, SeriesPoint>> {
        self.table.get(&threads)
    }

    /// Largest `max` over every point, used to share a y scale between plots.
    pub fn global_max(&self) -> f64 {
        self.global_max
    }

    /// Largest thread count of the sweep, whether or not it produced data.
    pub fn max_threads(&self) -> u32 {
        self.max_threads
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Warnings {
        std::mem::take(&mut self.warnings)
    }

    /// Iterates over thread counts in increasing order, with the points recorded at each.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<SeriesKey, SeriesPoint>)> {
        self.table.iter().map(|(threads, row)| (*threads, row))
    }

    /// Reshapes the table into one series per key.
    pub fn series(&self) -> BTreeMap<SeriesKey, Series> {
        let mut series: BTreeMap<SeriesKey, Series> = BTreeMap::new();
        for row in self.table.values() {
            for (key, point) in row {
                series
                    .entry(*key)
                    .or_insert_with(|| Series { key: *key, points: Vec::new() })
                    .points
                    .push(*point);
            }
        }
        series
    }

    /// Keeps only the series accepted by `keep`.
    ///
    /// The global maximum and thread range are those of the whole sweep, so plots made
    /// from different selections share their scales.
    pub fn select<F>(&self, keep: F) -> Aggregation
    where
        F: Fn(&SeriesKey) -> bool,
    {
        let table = self
            .table
            .iter()
            .filter_map(|(threads, row)| {
                let row: BTreeMap<_, _> = row.iter().filter(|(key, _)| keep(key)).map(|(k, p)| (*k, *p)).collect();
                (!row.is_empty()).then_some((*threads, row))
            })
            .collect();
        Aggregation {
            table,
            global_max: self.global_max,
            max_threads: self.max_threads,
            warnings: Warnings::new(),
        }
    }
}

/// Classifies every measurement of `parsed` and arranges them by series.
///
/// Unrecognized names and incomplete measurements are left out with a warning. When
/// two names map to the same key at one thread count, the first in name order is kept
/// and the other is reported as a duplicate.
/// Measurements whose median lies outside `[min, max]` are kept but flagged.
pub fn aggregate<F>(parsed: ParsedSweep, classify: F) -> Aggregation
where
    F: Fn(&str) -> Result<SeriesKey, Unrecognized>,
{
    let (points, mut warnings) = parsed.into_parts();
    let mut aggregation = Aggregation::default();

    for (threads, measurements) in points {
        aggregation.max_threads = aggregation.max_threads.max(threads);

        for (name, measurement) in measurements {
            let key = match classify(&name) {
                Ok(key) => key,
                Err(Unrecognized(name)) => {
                    warnings.push(Warning::Unrecognized { threads, name });
                    continue;
                }
            };
            let Some((min, max, med)) = measurement.complete() else {
                warnings.push(Warning::Incomplete { threads, name });
                continue;
            };
            if aggregation.contains(threads, &key) {
                warnings.push(Warning::Duplicate { threads, key: key.to_string(), name });
                continue;
            }
            if !(min <= med && med <= max) {
                warnings.push(Warning::OutOfOrder { threads, name });
            }

            aggregation.insert(key, SeriesPoint { threads, min, max, med });
        }
    }

    aggregation.warnings = warnings;
    aggregation
}
