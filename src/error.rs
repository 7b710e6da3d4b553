use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the dataset and evaluation pipeline.
///
/// `MalformedLine` and `DegenerateInput` are recoverable: callers log them
/// and move on. Every other variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not a readable directory: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("not writable as a file: {0}")]
    FileNotWritable(PathBuf),

    #[error("failed to read {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line_number} in {path}: {reason}")]
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        reason: String,
    },

    #[error("dataset inconsistency: {} identifier(s) missing across feature families: {}", missing.len(), missing.join(", "))]
    DatasetInconsistency { missing: Vec<String> },

    #[error("feature {0} declared twice")]
    DuplicateFeature(String),

    #[error("length mismatch: reference has {reference} labels, hypothesis has {hypothesis}")]
    LengthMismatch { reference: usize, hypothesis: usize },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("{command} exited with {status}: {stderr}")]
    EngineFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
