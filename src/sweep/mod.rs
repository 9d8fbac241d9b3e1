use crate::error::{Result, Warning, Warnings};
use crate::parser::{OutputParser, ParsedSweep};
use crate::runner::{RawRunResult, Runner, SweepConfiguration};
use crate::topology::ThreadRange;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Raw output of every point of a sweep, keyed by thread count.
#[derive(Debug, Clone, Default)]
pub struct RawSweep {
    runs: BTreeMap<u32, RawRunResult>,
    warnings: Warnings,
}

impl RawSweep {
    pub fn runs(&self) -> impl Iterator<Item = &RawRunResult> {
        self.runs.values()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Hands every run to the parser, consuming the raw output.
    pub fn parse(self, parser: &OutputParser) -> Result<ParsedSweep> {
        let mut parsed = ParsedSweep::with_warnings(self.warnings);
        for (threads, run) in self.runs {
            parsed.insert(threads, &run.stdout, parser)?;
        }
        Ok(parsed)
    }
}

/// Runs the benchmark once per thread count, in increasing order, one at a time.
///
/// Points never overlap: a concurrent run would share cores and caches with the one
/// being measured. The first launch failure aborts the sweep.
pub fn sweep<R: Runner + ?Sized>(runner: &mut R, range: ThreadRange) -> Result<RawSweep> {
    let mut raw = RawSweep::default();

    for threads in range.iter() {
        info!("Running {} with {} threads", runner.name(), threads);
        let config = SweepConfiguration::openmp(threads);
        let result = runner.run(&config)?;

        // Echo the output, as it is useful when watching a long sweep
        debug!("{}", result.stdout.trim_end());

        if !result.stderr.trim().is_empty() {
            raw.warnings.push(Warning::Stderr { threads, text: result.stderr.clone() });
        }
        if let Some(status) = &result.failed_status {
            raw.warnings.push(Warning::ExitStatus { threads, status: status.clone() });
        }

        raw.runs.insert(threads, result);
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SweepError;

    /// Runner that answers from a closure instead of launching a process.
    struct FnRunner<F>(F);

    impl<F: FnMut(&SweepConfiguration) -> Result<RawRunResult>> Runner for FnRunner<F> {
        fn run(&mut self, config: &SweepConfiguration) -> Result<RawRunResult> {
            (self.0)(config)
        }

        fn name(&self) -> &str {
            "fn"
        }
    }

    fn ok(threads: u32, stdout: &str) -> RawRunResult {
        RawRunResult {
            threads,
            stdout: stdout.to_string(),
            stderr: String::new(),
            failed_status: None,
        }
    }

    #[test]
    fn test_points_run_in_increasing_order() {
        let mut seen = Vec::new();
        let mut runner = FnRunner(|config: &SweepConfiguration| {
            seen.push(config.threads());
            Ok(ok(config.threads(), ""))
        });
        let raw = sweep(&mut runner, ThreadRange::new(5).unwrap()).unwrap();
        assert_eq!(raw.len(), 5);
        assert!(raw.warnings().is_empty());
        drop(runner);
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_launch_failure_stops_the_sweep() {
        let mut calls = 0;
        let mut runner = FnRunner(|config: &SweepConfiguration| {
            calls += 1;
            if config.threads() == 2 {
                return Err(SweepError::Launch {
                    executable: "bench".into(),
                    threads: 2,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(ok(config.threads(), ""))
        });
        let err = sweep(&mut runner, ThreadRange::new(4).unwrap()).unwrap_err();
        drop(runner);
        assert!(matches!(err, SweepError::Launch { threads: 2, .. }));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_failed_status_with_output_is_a_warning() {
        let mut runner = FnRunner(|config: &SweepConfiguration| {
            let mut result = ok(config.threads(), "Ar_Br_Cr, Min: 1s, Max: 1s, Med: 1s\n");
            result.failed_status = Some("exit status: 1".to_string());
            Ok(result)
        });
        let raw = sweep(&mut runner, ThreadRange::new(1).unwrap()).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(matches!(
            raw.warnings().iter().next(),
            Some(Warning::ExitStatus { threads: 1, .. })
        ));
    }
}
