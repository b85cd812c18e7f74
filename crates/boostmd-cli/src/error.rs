use boostmd::runner::RunnerError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Failed to parse input file '{path}': {source}", path = path.display())]
    InputParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 for a fatal failure inside a simulation chunk
    /// (already recorded in the energy log), 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Runner(e) if e.is_step_failure() => 2,
            _ => 1,
        }
    }
}
