use crate::error::{Result, SweepError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// Flag through which the benchmark receives its thread count.
pub const DEFAULT_THREAD_FLAG: &str = "--kokkos-num-threads";

/// Settings for one invocation of the benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfiguration {
    threads: u32,
    environment: BTreeMap<String, String>,
}

impl SweepConfiguration {
    pub fn new(threads: u32, environment: BTreeMap<String, String>) -> Self {
        SweepConfiguration { threads, environment }
    }

    /// OpenMP settings that pin one thread per core and fix the thread count.
    pub fn openmp(threads: u32) -> Self {
        let environment = BTreeMap::from([
            ("OMP_PROC_BIND".to_string(), "true".to_string()),
            ("OMP_PLACES".to_string(), "cores".to_string()),
            ("OMP_NUM_THREADS".to_string(), threads.to_string()),
        ]);
        SweepConfiguration { threads, environment }
    }

    pub fn threads(&self) -> u32 {
        self.threads
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
}

/// Everything one invocation printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRunResult {
    pub threads: u32,
    pub stdout: String,
    pub stderr: String,
    /// Set when the process exited unsuccessfully but still produced output.
    pub failed_status: Option<String>,
}

/// Represents something that can run the benchmark at a given configuration.
pub trait Runner {
    /// Runs the benchmark to completion and returns its captured output.
    fn run(&mut self, config: &SweepConfiguration) -> Result<RawRunResult>;

    /// Returns the name used in log messages.
    fn name(&self) -> &str;
}

/// Runs an executable as a child process, blocking until it exits.
pub struct ProcessRunner {
    executable: PathBuf,
    name: String,
    thread_flag: String,
}

impl ProcessRunner {
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        let executable = executable.as_ref().to_path_buf();
        let name = executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| executable.display().to_string());
        ProcessRunner {
            executable,
            name,
            thread_flag: DEFAULT_THREAD_FLAG.to_string(),
        }
    }

    pub fn with_thread_flag(mut self, flag: impl Into<String>) -> Self {
        self.thread_flag = flag.into();
        self
    }

    fn command(&self, config: &SweepConfiguration) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(format!("{}={}", self.thread_flag, config.threads()))
            .envs(config.environment());
        cmd
    }
}

impl Runner for ProcessRunner {
    fn run(&mut self, config: &SweepConfiguration) -> Result<RawRunResult> {
        let threads = config.threads();
        debug!(executable = %self.executable.display(), threads, "launching benchmark");

        let Output { status, stdout, stderr } =
            self.command(config).output().map_err(|source| SweepError::Launch {
                executable: self.executable.clone(),
                threads,
                source,
            })?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        // A run that died without printing anything leaves nothing to plot.
        if !status.success() && stdout.trim().is_empty() {
            return Err(SweepError::Launch {
                executable: self.executable.clone(),
                threads,
                source: std::io::Error::other(format!("{} with no output ({})", status, stderr.trim())),
            });
        }

        Ok(RawRunResult {
            threads,
            stdout,
            stderr,
            failed_status: (!status.success()).then(|| status.to_string()),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs `cmake --build <dir>` so the benchmark executables are up to date.
pub fn cmake_build(build_dir: &Path) -> Result<()> {
    info!(dir = %build_dir.display(), "building benchmarks");
    let status = Command::new("cmake")
        .arg("--build")
        .arg(build_dir)
        .status()
        .map_err(|e| SweepError::Build(format!("could not run cmake: {}", e)))?;

    if !status.success() {
        return Err(SweepError::Build(format!("cmake --build {} {}", build_dir.display(), status)));
    }
    Ok(())
}
