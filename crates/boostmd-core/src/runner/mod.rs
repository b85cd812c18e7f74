//! # Runner Module
//!
//! This module implements the staged chunk-execution core: everything
//! between "a configured engine exists" and "the run completed or failed
//! fatally, with its artifacts on disk".
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - the immutable run parameters and the
//!   cross-field invariants the chunk loop relies on
//! - **Stage Controller** ([`stage`]) - pure step-to-stage mapping
//! - **Output Artifact Manager** ([`artifacts`]) - directory tree lifecycle
//!   and restart-indexed file naming
//! - **Checkpoint Manager** ([`checkpoint`]) - rolling checkpoint and
//!   step-indexed snapshot persistence
//! - **Energy/Boost Logger** ([`log`]) - the append-only per-chunk record
//!   stream
//! - **Chunk Executor** ([`executor`]) - the ordered loop that ties the
//!   above together and owns failure handling
//! - **Progress Monitoring** ([`progress`]) - per-chunk observability events
//! - **Error Handling** ([`error`]) - the runner error taxonomy and its
//!   mapping to process exit codes
//!
//! ## Resumability contract
//!
//! Resuming from the rolling checkpoint at step S and continuing is
//! indistinguishable, in logged records, from an uninterrupted run reaching
//! step S. The primary energy log is append-only across restarts; secondary
//! logs and trajectories get a fresh `restartN` index per process.

pub mod artifacts;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod executor;
pub mod log;
pub mod progress;
pub mod stage;

pub use config::{SimulationConfig, SimulationConfigBuilder};
pub use error::RunnerError;
pub use executor::{RunSummary, Runner};
