pub mod aggregate;
pub mod benchmark;
pub mod classifier;
pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod sweep;
pub mod topology;

pub use error::{Result, SweepError, Warning, Warnings};
