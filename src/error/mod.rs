use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a sweep or a report.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The benchmark executable could not be started or waited on.
    #[error("Failed to launch '{}' with {threads} threads: {source}", executable.display())]
    Launch {
        executable: PathBuf,
        threads: u32,
        #[source]
        source: io::Error,
    },

    /// The pre-sweep build command did not succeed.
    #[error("Build step failed: {0}")]
    Build(String),

    /// A statistic field in the benchmark output is not a number.
    #[error("Malformed {field} value '{text}' on output line {line}")]
    Parse {
        line: usize,
        field: &'static str,
        text: String,
    },

    /// A report log could not be read back.
    #[error("Malformed log line {line}: {reason}")]
    Log { line: usize, reason: String },

    /// Writing an artifact failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The plotting backend failed.
    #[error("Failed to draw '{}': {reason}", path.display())]
    Plot { path: PathBuf, reason: String },

    /// A series read back from a log is foreign to the chosen naming convention.
    #[error("Series '{key}' does not belong to the {convention} benchmark")]
    Convention { key: String, convention: &'static str },

    /// The requested thread range is empty.
    #[error("Thread range must contain at least one value")]
    EmptyRange,
}

/// Result type for sweep operations.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Recoverable conditions collected along the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The benchmark wrote to its error stream.
    Stderr { threads: u32, text: String },
    /// The benchmark exited unsuccessfully after printing results.
    ExitStatus { threads: u32, status: String },
    /// A non-blank output line carried no statistic.
    UnknownLine { threads: u32, line: String },
    /// A measurement name matched no classification rule.
    Unrecognized { threads: u32, name: String },
    /// A measurement lacks one of min, max or med.
    Incomplete { threads: u32, name: String },
    /// The median is not between min and max; the point is still plotted.
    OutOfOrder { threads: u32, name: String },
    /// Another name already supplied this key at this thread count; `name` was dropped.
    Duplicate { threads: u32, key: String, name: String },
    /// A series has no marker, so it only appears in the log.
    MissingStyle { key: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Stderr { threads, text } => {
                write!(f, "[{} threads] benchmark stderr: {}", threads, text.trim_end())
            }
            Warning::ExitStatus { threads, status } => {
                write!(f, "[{} threads] benchmark {}", threads, status)
            }
            Warning::UnknownLine { threads, line } => {
                write!(f, "[{} threads] unknown output line: {}", threads, line)
            }
            Warning::Unrecognized { threads, name } => {
                write!(f, "[{} threads] unknown name: {}", threads, name)
            }
            Warning::Incomplete { threads, name } => {
                write!(f, "[{} threads] incomplete measurement: {}", threads, name)
            }
            Warning::OutOfOrder { threads, name } => {
                write!(f, "[{} threads] {} has min <= med <= max violated", threads, name)
            }
            Warning::Duplicate { threads, key, name } => {
                write!(f, "[{} threads] {} already has a point, ignoring {}", threads, key, name)
            }
            Warning::MissingStyle { key } => write!(f, "{} has no marker, left out of the plot", key),
        }
    }
}

/// Ordered list of warnings, handed from stage to stage with the data it describes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and emits it through the log.
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.0.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }
}
