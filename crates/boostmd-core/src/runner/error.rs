use crate::engine::{EngineError, StepFault};
use crate::runner::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy of a chunked run.
///
/// The split matters for the process exit code: everything except
/// [`RunnerError::StepFailure`] is a setup or I/O problem (exit code 1),
/// while a step failure is a non-recoverable fault inside a simulation chunk
/// (exit code 2) that has already been recorded in the energy log.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Output directory {path} already exists; set overwrite_output to replace it")]
    OutputDirectoryExists { path: PathBuf },

    #[error("Output directory {path} is missing; a restart never recreates it")]
    OutputDirectoryMissing { path: PathBuf },

    #[error("Simulation step failure at step {step}: {fault}")]
    StepFailure { step: u64, fault: StepFault },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Whether this error was raised by the engine mid-chunk, after the
    /// failure record was appended to the energy log.
    pub fn is_step_failure(&self) -> bool {
        matches!(self, RunnerError::StepFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
