//! # Engine Module
//!
//! This module defines the boundary between the chunk runner and the physics
//! engine that actually integrates the equations of motion.
//!
//! ## Overview
//!
//! The runner never touches forces, coordinates, or boost math directly. It
//! consumes the [`SimulationEngine`] capability trait: advance by a number of
//! integration steps, read back energy/boost diagnostics, serialize state
//! into an opaque checkpoint blob, and export human-inspectable snapshots.
//! Concrete engines are selected through the closed [`BoostVariant`]
//! enumeration and its factory, so the runner stays independent of any
//! particular boost formulation.
//!
//! - **Capability trait** ([`SimulationEngine`]) and the diagnostics record
//!   ([`EnergyReport`]) every engine must be able to produce.
//! - **Variant selection** ([`BoostVariant`], [`build_engine`]) mapping the
//!   boost-type names accepted on the command line to engine constructors.
//! - **Reference implementation** ([`langevin`]) used by the shipped binary
//!   and as the deterministic engine in tests.

pub mod langevin;
mod variants;

pub use variants::{BoostVariant, build_engine};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Faults raised by an engine while integrating. A fault is terminal for the
/// run: the runner logs a failure record and stops without retrying.
#[derive(Debug, Error)]
pub enum StepFault {
    #[error("non-finite energy encountered at step {step}")]
    NonFiniteEnergy { step: u64 },

    #[error("engine fault at step {step}: {reason}")]
    Other { step: u64, reason: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("checkpoint serialization failed: {0}")]
    Checkpoint(#[from] postcard::Error),

    #[error("state serialization failed: {0}")]
    State(#[from] toml::ser::Error),

    #[error("position export failed: {0}")]
    Positions(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-chunk energy and boost diagnostics, in the engine's native units
/// (kJ/mol for energies). Reading diagnostics must never fail, so that
/// whatever values survive an integration fault can still be logged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyReport {
    /// Unboosted total potential energy.
    pub potential_energy: f64,
    /// Unboosted energy of the bias-relevant (dihedral) force class. Exposed
    /// as an explicit accessor by the engine rather than discovered by the
    /// runner scanning force collections.
    pub dihedral_energy: f64,
    pub total_force_scale: f64,
    pub dihedral_force_scale: f64,
    /// Boost currently added to the total potential.
    pub boost_potential: f64,
    /// Boost currently added to the dihedral term.
    pub dihedral_boost: f64,
}

/// Where the engine's native reporters should write, and how often.
#[derive(Debug, Clone)]
pub struct ReporterSpec {
    pub trajectory_path: PathBuf,
    pub state_log_path: PathBuf,
    /// Steps between state-data rows.
    pub energy_frequency: u64,
    /// Steps between trajectory frames.
    pub coordinate_frequency: u64,
}

/// Capability interface consumed by the chunk runner.
///
/// An engine owns the full mutable simulation state. The runner holds it
/// exclusively for the process lifetime and drives it strictly sequentially;
/// implementations may assume single-threaded access.
pub trait SimulationEngine {
    /// Total number of integration steps this engine is configured to run.
    /// This value, not the config's, is authoritative for chunk accounting,
    /// so engine-side step-count adjustments are tolerated.
    fn total_steps(&self) -> u64;

    /// True internal progress. The single source of truth for the restart
    /// position after a checkpoint restore.
    fn current_step(&self) -> u64;

    /// Advance exactly `steps` integration steps, or fault. A fault leaves
    /// the engine in a state where [`SimulationEngine::diagnostics`] still
    /// returns whatever values remain readable.
    fn advance(&mut self, steps: u64) -> Result<(), StepFault>;

    /// Best-effort snapshot of the current energy/boost diagnostics.
    fn diagnostics(&self) -> EnergyReport;

    /// Serialize the complete mutable state (including any RNG state) into
    /// an opaque blob. Restoring the blob and continuing must be bit-exact
    /// with an uninterrupted run.
    fn save_checkpoint(&self) -> Result<Vec<u8>, EngineError>;

    /// Replace the engine's state with a previously serialized blob.
    fn load_checkpoint(&mut self, blob: &[u8]) -> Result<(), EngineError>;

    /// Write a human-inspectable state file (not suitable for resumption).
    fn save_state(&self, path: &Path) -> Result<(), EngineError>;

    /// Export current positions as CSV.
    fn export_positions(&self, path: &Path) -> Result<(), EngineError>;

    /// Open the engine's native trajectory and state-data reporters. Called
    /// once per process, after any checkpoint restore. Reporter files are
    /// process-local and are deliberately excluded from checkpoints.
    fn attach_reporters(&mut self, spec: &ReporterSpec) -> Result<(), EngineError>;
}
