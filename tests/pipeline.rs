use scaling_sweep_rs::aggregate::aggregate;
use scaling_sweep_rs::benchmark::run_benchmark;
use scaling_sweep_rs::classifier::{NamingConvention, SeriesKey};
use scaling_sweep_rs::parser::{Measurement, ParsedSweep};
use scaling_sweep_rs::report::{format_log, read_log, write_log};
use scaling_sweep_rs::runner::{RawRunResult, Runner, SweepConfiguration};
use scaling_sweep_rs::sweep::sweep;
use scaling_sweep_rs::topology::ThreadRange;
use scaling_sweep_rs::{Result, Warning};
use std::collections::BTreeMap;

/// Runner replaying a fixed output per thread count.
struct Scripted {
    outputs: BTreeMap<u32, (String, String)>,
    calls: Vec<u32>,
}

impl Scripted {
    fn new<F: Fn(u32) -> (String, String)>(max: u32, output: F) -> Self {
        Scripted {
            outputs: (1..=max).map(|t| (t, output(t))).collect(),
            calls: Vec::new(),
        }
    }
}

impl Runner for Scripted {
    fn run(&mut self, config: &SweepConfiguration) -> Result<RawRunResult> {
        self.calls.push(config.threads());
        let (stdout, stderr) = self.outputs[&config.threads()].clone();
        Ok(RawRunResult {
            threads: config.threads(),
            stdout,
            stderr,
            failed_status: None,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn line(name: &str, min: f64, max: f64, med: f64) -> String {
    format!("{}, Min: {}s, Max: {}s, Med: {}s\n", name, min, max, med)
}

fn cache_blocking_output(threads: u32) -> String {
    let t = threads as f64;
    [
        line("No Cache Blocking", 4.0 / t, 5.0 / t, 4.5 / t),
        line("Cache Blocked i,16", 0.5 / t, 1.5 / t, 0.9 / t),
        line("Cache Blocked ij,32", 0.25 / t, 0.75 / t, 0.5 / t),
        line("Foo Bar", 9.0, 99.0, 10.0),
    ]
    .concat()
}

#[test]
fn stderr_on_one_point_does_not_stop_the_sweep() {
    let mut runner = Scripted::new(4, |t| {
        let stderr = if t == 3 { "Kokkos: thread binding failed\n".to_string() } else { String::new() };
        (cache_blocking_output(t), stderr)
    });

    let raw = sweep(&mut runner, ThreadRange::new(4).unwrap()).unwrap();
    assert_eq!(runner.calls, vec![1, 2, 3, 4]);
    let stderr_warnings: Vec<_> = raw
        .warnings()
        .iter()
        .filter(|w| matches!(w, Warning::Stderr { .. }))
        .cloned()
        .collect();
    assert_eq!(
        stderr_warnings,
        vec![Warning::Stderr { threads: 3, text: "Kokkos: thread binding failed\n".to_string() }]
    );

    let parsed = raw.parse(&NamingConvention::CacheBlocking.parser()).unwrap();
    let aggregation = aggregate(parsed, |name| NamingConvention::CacheBlocking.classify(name));
    for series in aggregation.series().values() {
        let threads: Vec<u32> = series.points().iter().map(|p| p.threads).collect();
        assert_eq!(threads, vec![1, 2, 3, 4], "series {}", series.key());
    }
}

#[test]
fn unrecognized_names_are_reported_but_never_plotted() {
    let mut runner = Scripted::new(2, |t| (cache_blocking_output(t), String::new()));
    let aggregation = run_benchmark(&mut runner, ThreadRange::new(2).unwrap(), NamingConvention::CacheBlocking).unwrap();

    let keys: Vec<String> = aggregation.series().keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["No Cache Blocking", "Block size 16", "Block size 32x32"]);
    assert!(!format_log(&aggregation).contains("Foo Bar"));
    assert_eq!(aggregation.global_max(), 5.0);

    let unknown: Vec<_> = aggregation
        .warnings()
        .iter()
        .filter_map(|w| match w {
            Warning::Unrecognized { threads, name } => Some((*threads, name.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(unknown, vec![(1, "Foo Bar".to_string()), (2, "Foo Bar".to_string())]);
}

#[test]
fn log_reproduces_parsed_measurements() {
    let names = ["Ar_Br_Cr", "Ar_Bl_Cr", "Al_Bl_Cl"];
    let mut expected: BTreeMap<(u32, String), (f64, f64, f64)> = BTreeMap::new();
    let mut runner = Scripted::new(3, |t| {
        let output: String = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let base = 0.1 * (i as f64 + 1.0) / t as f64;
                line(name, base, base * 3.0, base * 1.7)
            })
            .collect();
        (format!("Layout benchmark\n{}", output), String::new())
    });
    for t in 1..=3u32 {
        for (i, name) in names.iter().enumerate() {
            let base = 0.1 * (i as f64 + 1.0) / t as f64;
            expected.insert((t, name.to_string()), (base, base * 3.0, base * 1.7));
        }
    }

    let aggregation = run_benchmark(&mut runner, ThreadRange::new(3).unwrap(), NamingConvention::Layout).unwrap();
    assert!(aggregation.warnings().is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strong_scaling_layout_all.log");
    write_log(&aggregation, &path).unwrap();
    let read = read_log(&std::fs::read_to_string(&path).unwrap()).unwrap();

    let mut actual = BTreeMap::new();
    for (threads, row) in read.rows() {
        for (key, point) in row {
            actual.insert((threads, key.to_string()), (point.min, point.max, point.med));
        }
    }
    assert_eq!(actual, expected);
}

#[test]
fn rendering_the_same_data_twice_gives_the_same_log() {
    let mut first = Scripted::new(3, |t| (cache_blocking_output(t), String::new()));
    let mut second = Scripted::new(3, |t| (cache_blocking_output(t), String::new()));
    let a = run_benchmark(&mut first, ThreadRange::new(3).unwrap(), NamingConvention::CacheBlocking).unwrap();
    let b = run_benchmark(&mut second, ThreadRange::new(3).unwrap(), NamingConvention::CacheBlocking).unwrap();

    let dir = tempfile::tempdir().unwrap();
    write_log(&a, &dir.path().join("a.log")).unwrap();
    write_log(&b, &dir.path().join("b.log")).unwrap();
    assert_eq!(
        std::fs::read(dir.path().join("a.log")).unwrap(),
        std::fs::read(dir.path().join("b.log")).unwrap()
    );
}

#[test]
fn points_are_ascending_even_when_recorded_out_of_order() {
    let mut parsed = ParsedSweep::new();
    for threads in [3, 1, 4, 2] {
        let m = Measurement::new("Al_Br_Cl", 1.0, 2.0, 1.5);
        parsed.insert_measurements(threads, BTreeMap::from([(m.name.clone(), m)]));
    }
    let aggregation = aggregate(parsed, |name| NamingConvention::Layout.classify(name));
    let key: SeriesKey = "Al_Br_Cl".parse().unwrap();
    let threads: Vec<u32> = aggregation.series()[&key].points().iter().map(|p| p.threads).collect();
    assert_eq!(threads, vec![1, 2, 3, 4]);
}

#[test]
fn malformed_timing_aborts_the_sweep() {
    let mut runner = Scripted::new(2, |t| {
        let stdout = if t == 2 { "Ar_Br_Cr, Min: 1..0s, Max: 2s, Med: 1s\n".to_string() } else { line("Ar_Br_Cr", 1.0, 2.0, 1.5) };
        (stdout, String::new())
    });
    let err = run_benchmark(&mut runner, ThreadRange::new(2).unwrap(), NamingConvention::Layout).unwrap_err();
    assert!(err.to_string().contains("1..0"));
}
