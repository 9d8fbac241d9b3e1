use crate::aggregate::{aggregate, Aggregation};
use crate::classifier::{NamingConvention, SeriesKey, Tiling};
use crate::error::{Result, SweepError};
use crate::report::{ReportArtifact, Reporter};
use crate::runner::Runner;
use crate::sweep::sweep;
use crate::topology::ThreadRange;
use std::path::Path;

/// Sweeps `runner` over `range` and aggregates its output under `convention`.
///
/// Each stage consumes the previous one's result: raw output goes to the parser,
/// parsed measurements go to the aggregator. Every thread count of `range` is part of
/// the result's thread range, even one that printed nothing usable.
pub fn run_benchmark<R: Runner + ?Sized>(
    runner: &mut R,
    range: ThreadRange,
    convention: NamingConvention,
) -> Result<Aggregation> {
    let raw = sweep(runner, range)?;
    let parsed = raw.parse(&convention.parser())?;
    Ok(aggregate(parsed, |name| convention.classify(name)))
}

/// Base names of the two cache-blocking reports.
pub const CACHE_BLOCKING_REPORTS: [(&str, Tiling); 2] = [
    ("strong_scaling_cache_blocking_i", Tiling::I),
    ("strong_scaling_cache_blocking_ij", Tiling::Ij),
];

/// Writes one report per tiling, each also showing the untiled baseline.
///
/// Both charts share the y scale of the whole sweep.
pub fn report_cache_blocking(aggregation: &Aggregation, reporter: &Reporter) -> Result<Vec<ReportArtifact>> {
    CACHE_BLOCKING_REPORTS
        .iter()
        .map(|(name, tiling)| {
            let selection = aggregation.select(|key| match key {
                SeriesKey::Baseline => true,
                SeriesKey::Block { tiling: t, .. } => t == tiling,
                SeriesKey::Layout(_) => false,
            });
            reporter.render(&selection, name)
        })
        .collect()
}

/// Writes the report of one layout benchmark.
pub fn report_layout(aggregation: &Aggregation, reporter: &Reporter, name: &str) -> Result<ReportArtifact> {
    reporter.clone().with_legend_table(true).render(aggregation, name)
}

/// Redraws a report from a log read back with [`crate::report::read_log`].
///
/// Every series of the log must belong to `convention`.
pub fn replot(
    aggregation: &Aggregation,
    reporter: &Reporter,
    convention: NamingConvention,
    name: &str,
) -> Result<ReportArtifact> {
    if let Some(key) = aggregation.series().into_keys().find(|key| !convention.accepts(key)) {
        return Err(SweepError::Convention { key: key.to_string(), convention: convention.name() });
    }
    match convention {
        NamingConvention::Layout => report_layout(aggregation, reporter, name),
        NamingConvention::CacheBlocking => reporter.render(aggregation, name),
    }
}

/// Report name for a layout executable: `top.benchmark_layout_all` becomes
/// `strong_scaling_layout_all`.
pub fn layout_report_name(executable: &Path) -> String {
    let stem = executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix("top.").unwrap_or(&stem);
    let stem = stem.strip_prefix("benchmark_").unwrap_or(stem);
    format!("strong_scaling_{}", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{RawRunResult, SweepConfiguration};

    struct Canned(&'static str);

    impl Runner for Canned {
        fn run(&mut self, config: &SweepConfiguration) -> Result<RawRunResult> {
            Ok(RawRunResult {
                threads: config.threads(),
                stdout: self.0.to_string(),
                stderr: String::new(),
                failed_status: None,
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_layout_report_names() {
        assert_eq!(layout_report_name(Path::new("./build/benchmarks/top.benchmark_layout_all")), "strong_scaling_layout_all");
        assert_eq!(layout_report_name(Path::new("layout_minus_outliers")), "strong_scaling_layout_minus_outliers");
    }

    #[test]
    fn test_run_benchmark_covers_the_whole_range() {
        let mut runner = Canned("Reference, Min: 1s, Max: 2s, Med: 1.5s\n");
        let aggregation = run_benchmark(&mut runner, ThreadRange::new(3).unwrap(), NamingConvention::CacheBlocking).unwrap();
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.max_threads(), 3);
        assert_eq!(aggregation.warnings().len(), 3);
    }

    #[test]
    fn test_run_benchmark_layout() {
        let mut runner = Canned("Ar_Br_Cr, Min: 1s, Max: 2s, Med: 1.5s\nAl_Bl_Cl, Min: 2s, Max: 4s, Med: 3s\n");
        let aggregation = run_benchmark(&mut runner, ThreadRange::new(2).unwrap(), NamingConvention::Layout).unwrap();
        let series = aggregation.series();
        assert_eq!(series.len(), 2);
        assert!(series.values().all(|s| s.len() == 2));
        assert_eq!(aggregation.global_max(), 4.0);
    }

    fn cache_blocking_sweep() -> Aggregation {
        let mut runner = Canned(
            "No Cache Blocking, Min: 2s, Max: 3s, Med: 2.5s\n\
             Cache Blocked i,16, Min: 0.5s, Max: 1.5s, Med: 0.9s\n\
             Cache Blocked ij,32, Min: 1s, Max: 8s, Med: 4s\n",
        );
        run_benchmark(&mut runner, ThreadRange::new(2).unwrap(), NamingConvention::CacheBlocking).unwrap()
    }

    #[test]
    fn test_cache_blocking_reports_split_by_tiling() {
        let dir = tempfile::tempdir().unwrap();
        let aggregation = cache_blocking_sweep();
        let artifacts = report_cache_blocking(&aggregation, &Reporter::new(dir.path())).unwrap();

        let names: Vec<String> = artifacts
            .iter()
            .map(|a| a.log.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["strong_scaling_cache_blocking_i", "strong_scaling_cache_blocking_ij"]);
        for artifact in &artifacts {
            assert!(artifact.png.is_file() && artifact.svg.is_file());
        }

        let i_log = std::fs::read_to_string(&artifacts[0].log).unwrap();
        let ij_log = std::fs::read_to_string(&artifacts[1].log).unwrap();
        assert!(i_log.contains("No Cache Blocking") && i_log.contains("Block size 16:"));
        assert!(!i_log.contains("32x32"));
        assert!(ij_log.contains("No Cache Blocking") && ij_log.contains("Block size 32x32"));
        assert!(!ij_log.contains("Block size 16:"));
    }

    #[test]
    fn test_cache_blocking_selections_share_the_y_scale() {
        let aggregation = cache_blocking_sweep();
        for (_, tiling) in CACHE_BLOCKING_REPORTS {
            let selection = aggregation.select(|key| match key {
                SeriesKey::Baseline => true,
                SeriesKey::Block { tiling: t, .. } => *t == tiling,
                SeriesKey::Layout(_) => false,
            });
            assert_eq!(selection.global_max(), 8.0);
            assert_eq!(selection.max_threads(), 2);
        }
    }

    #[test]
    fn test_replot_rejects_foreign_series() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path());
        let err = replot(&cache_blocking_sweep(), &reporter, NamingConvention::Layout, "replot").unwrap_err();
        assert!(matches!(err, SweepError::Convention { convention: "layout", .. }));
        assert!(!dir.path().join("replot.log").exists());
    }

    #[test]
    fn test_replot_redraws_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path());
        let original = cache_blocking_sweep();
        let read = crate::report::read_log(&crate::report::format_log(&original)).unwrap();

        let artifact = replot(&read, &reporter, NamingConvention::CacheBlocking, "replot").unwrap();
        assert_eq!(
            std::fs::read_to_string(artifact.log).unwrap(),
            crate::report::format_log(&original)
        );
    }
}
