use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scaling_sweep_rs::benchmark::{layout_report_name, replot, report_cache_blocking, report_layout, run_benchmark};
use scaling_sweep_rs::classifier::NamingConvention;
use scaling_sweep_rs::report::{read_log, ReportArtifact, Reporter};
use scaling_sweep_rs::runner::{cmake_build, ProcessRunner, DEFAULT_THREAD_FLAG};
use scaling_sweep_rs::topology::{usable_worker_contexts, ThreadRange};
use scaling_sweep_rs::Warnings;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CACHE_BLOCKING_EXECUTABLE: &str = "./build/benchmarks/top.benchmark_cache_blocking";
const LAYOUT_EXECUTABLES: [&str; 2] = [
    "./build/benchmarks/top.benchmark_layout_all",
    "./build/benchmarks/top.benchmark_layout_minus_outliers",
];

/// Strong-scaling sweeps of the matrix product benchmarks.
#[derive(Parser, Debug)]
#[command(name = "strong_scaling")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory receiving the charts and logs.
    #[arg(long, env = "SWEEP_RESULTS_DIR", default_value = "results", global = true)]
    results_dir: PathBuf,

    /// Largest thread count to sweep to, instead of the detected processor count.
    #[arg(long, env = "SWEEP_MAX_THREADS", global = true)]
    max_threads: Option<u32>,

    /// Flag through which the benchmark receives the thread count.
    #[arg(long, default_value = DEFAULT_THREAD_FLAG, global = true)]
    thread_flag: String,

    /// Run `cmake --build <dir>` before sweeping.
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,

    /// Log every run's output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sweep the cache-blocking benchmark and plot the i and ij tilings.
    CacheBlocking {
        #[arg(long, default_value = CACHE_BLOCKING_EXECUTABLE)]
        executable: PathBuf,

        /// Factor applied to the processor count, 2 to include SMT siblings.
        #[arg(long, default_value_t = 2)]
        smt_multiplier: u32,
    },

    /// Sweep the layout benchmarks, one chart per executable.
    Layout {
        #[arg(long = "executable", default_values = LAYOUT_EXECUTABLES)]
        executables: Vec<PathBuf>,

        /// Factor applied to the processor count, 2 to include SMT siblings.
        #[arg(long, default_value_t = 1)]
        smt_multiplier: u32,
    },

    /// Redraw a chart from a log written by an earlier sweep.
    Replot {
        log: PathBuf,

        /// Benchmark family the log came from; its series must all belong to it.
        #[arg(long, value_enum)]
        convention: Convention,

        /// Base name of the new chart; defaults to the log's own name.
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Convention {
    CacheBlocking,
    Layout,
}

impl From<Convention> for NamingConvention {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::CacheBlocking => NamingConvention::CacheBlocking,
            Convention::Layout => NamingConvention::Layout,
        }
    }
}

fn thread_range(cli: &Cli, smt_multiplier: u32) -> anyhow::Result<ThreadRange> {
    let range = match cli.max_threads {
        Some(max) => ThreadRange::new(max)?,
        None => ThreadRange::from_topology(usable_worker_contexts(), smt_multiplier)?,
    };
    info!("Max threads: {}", range.max());
    Ok(range)
}

fn print_warnings(warnings: &Warnings) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{} warning(s):", warnings.len());
    for warning in warnings.iter() {
        println!("  - {}", warning);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(dir) = &cli.build_dir {
        cmake_build(dir)?;
    }

    let reporter = Reporter::new(&cli.results_dir);
    let mut warnings = Warnings::new();
    let mut artifacts: Vec<ReportArtifact> = Vec::new();

    match &cli.command {
        Commands::CacheBlocking { executable, smt_multiplier } => {
            let range = thread_range(&cli, *smt_multiplier)?;
            let mut runner = ProcessRunner::new(executable).with_thread_flag(cli.thread_flag.clone());
            let mut aggregation = run_benchmark(&mut runner, range, NamingConvention::CacheBlocking)
                .with_context(|| format!("cache-blocking sweep of {}", executable.display()))?;
            warnings.extend(aggregation.take_warnings());
            artifacts.extend(report_cache_blocking(&aggregation, &reporter)?);
        }
        Commands::Layout { executables, smt_multiplier } => {
            let range = thread_range(&cli, *smt_multiplier)?;
            for executable in executables {
                let mut runner = ProcessRunner::new(executable).with_thread_flag(cli.thread_flag.clone());
                let mut aggregation = run_benchmark(&mut runner, range, NamingConvention::Layout)
                    .with_context(|| format!("layout sweep of {}", executable.display()))?;
                warnings.extend(aggregation.take_warnings());
                artifacts.push(report_layout(&aggregation, &reporter, &layout_report_name(executable))?);
            }
        }
        Commands::Replot { log, convention, output } => {
            let text = fs::read_to_string(log).with_context(|| format!("reading {}", log.display()))?;
            let aggregation = read_log(&text).with_context(|| format!("parsing {}", log.display()))?;
            let name = match output {
                Some(name) => name.clone(),
                None => log
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .context("log path has no file name")?,
            };
            artifacts.push(replot(&aggregation, &reporter, NamingConvention::from(*convention), &name)?);
        }
    }

    for artifact in artifacts {
        warnings.extend(artifact.warnings);
    }
    print_warnings(&warnings);
    println!("Results written to {}", reporter.results_dir().display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
