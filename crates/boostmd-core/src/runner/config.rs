//! Immutable run configuration, loaded once before the chunk loop starts.
//!
//! Frequencies are expressed in integration steps. Every cadence the runner
//! derives (checkpoint, snapshot) must be an exact multiple of the chunk
//! size; violations are configuration errors caught by [`SimulationConfig::validate`]
//! before any side effect, never mid-run faults.

use crate::engine::BoostVariant;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter {name} must be positive (got {value})")]
    NotPositive { name: &'static str, value: u64 },

    #[error("{name} ({value}) must be an exact multiple of chunk_size ({chunk_size})")]
    NotChunkAligned {
        name: &'static str,
        value: u64,
        chunk_size: u64,
    },
}

fn default_sigma0() -> f64 {
    // 6 kcal/mol, the conventional default, in native kJ/mol.
    6.0 * 4.184
}

fn default_seed() -> u64 {
    2_085_224_246
}

fn default_reporter_frequency() -> u64 {
    10_000
}

fn default_file_type() -> String {
    "csv".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Target temperature, Kelvin.
    pub temperature: f64,
    /// Integration timestep, femtoseconds.
    pub timestep_fs: f64,

    // Stage boundaries, in steps. `ntcmd`/`nteb` are cumulative within their
    // phase; see `StageSchedule`.
    pub ntcmdprep: u64,
    pub ntcmd: u64,
    pub ntebprep: u64,
    pub nteb: u64,

    /// Total steps the run should reach (`nstlim`). The engine's own value
    /// remains authoritative at run time.
    pub total_steps: u64,
    /// Steps advanced per chunk.
    pub chunk_size: u64,
    /// Steps between rolling-checkpoint saves.
    pub checkpoint_frequency: u64,
    /// Steps between durable snapshots (`ntave`).
    pub snapshot_frequency: u64,

    pub output_directory: PathBuf,
    #[serde(default)]
    pub overwrite_output: bool,

    #[serde(default)]
    pub boost_variant: BoostVariant,
    /// Upper bound of the boost standard deviation, kJ/mol.
    #[serde(default = "default_sigma0")]
    pub sigma0: f64,
    #[serde(default = "default_seed")]
    pub random_seed: u64,

    /// Steps between state-data reporter rows.
    #[serde(default = "default_reporter_frequency")]
    pub energy_reporter_frequency: u64,
    /// Steps between trajectory frames.
    #[serde(default = "default_reporter_frequency")]
    pub coordinates_reporter_frequency: u64,
    /// Extension of the trajectory file (`output.<ext>`).
    #[serde(default = "default_file_type")]
    pub coordinates_reporter_file_type: String,
}

impl SimulationConfig {
    /// Check the cross-field invariants that the chunk loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("chunk_size", self.chunk_size),
            ("total_steps", self.total_steps),
            ("checkpoint_frequency", self.checkpoint_frequency),
            ("snapshot_frequency", self.snapshot_frequency),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        for (name, value) in [
            ("checkpoint_frequency", self.checkpoint_frequency),
            ("snapshot_frequency", self.snapshot_frequency),
        ] {
            if value % self.chunk_size != 0 {
                return Err(ConfigError::NotChunkAligned {
                    name,
                    value,
                    chunk_size: self.chunk_size,
                });
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    temperature: Option<f64>,
    timestep_fs: Option<f64>,
    ntcmdprep: Option<u64>,
    ntcmd: Option<u64>,
    ntebprep: Option<u64>,
    nteb: Option<u64>,
    total_steps: Option<u64>,
    chunk_size: Option<u64>,
    checkpoint_frequency: Option<u64>,
    snapshot_frequency: Option<u64>,
    output_directory: Option<PathBuf>,
    overwrite_output: bool,
    boost_variant: Option<BoostVariant>,
    sigma0: Option<f64>,
    random_seed: Option<u64>,
    energy_reporter_frequency: Option<u64>,
    coordinates_reporter_frequency: Option<u64>,
    coordinates_reporter_file_type: Option<String>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn timestep_fs(mut self, fs: f64) -> Self {
        self.timestep_fs = Some(fs);
        self
    }
    pub fn ntcmdprep(mut self, steps: u64) -> Self {
        self.ntcmdprep = Some(steps);
        self
    }
    pub fn ntcmd(mut self, steps: u64) -> Self {
        self.ntcmd = Some(steps);
        self
    }
    pub fn ntebprep(mut self, steps: u64) -> Self {
        self.ntebprep = Some(steps);
        self
    }
    pub fn nteb(mut self, steps: u64) -> Self {
        self.nteb = Some(steps);
        self
    }
    pub fn total_steps(mut self, steps: u64) -> Self {
        self.total_steps = Some(steps);
        self
    }
    pub fn chunk_size(mut self, steps: u64) -> Self {
        self.chunk_size = Some(steps);
        self
    }
    pub fn checkpoint_frequency(mut self, steps: u64) -> Self {
        self.checkpoint_frequency = Some(steps);
        self
    }
    pub fn snapshot_frequency(mut self, steps: u64) -> Self {
        self.snapshot_frequency = Some(steps);
        self
    }
    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(path.into());
        self
    }
    pub fn overwrite_output(mut self, overwrite: bool) -> Self {
        self.overwrite_output = overwrite;
        self
    }
    pub fn boost_variant(mut self, variant: BoostVariant) -> Self {
        self.boost_variant = Some(variant);
        self
    }
    pub fn sigma0(mut self, kj_per_mol: f64) -> Self {
        self.sigma0 = Some(kj_per_mol);
        self
    }
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
    pub fn energy_reporter_frequency(mut self, steps: u64) -> Self {
        self.energy_reporter_frequency = Some(steps);
        self
    }
    pub fn coordinates_reporter_frequency(mut self, steps: u64) -> Self {
        self.coordinates_reporter_frequency = Some(steps);
        self
    }
    pub fn coordinates_reporter_file_type(mut self, ext: impl Into<String>) -> Self {
        self.coordinates_reporter_file_type = Some(ext.into());
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            temperature: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            timestep_fs: self
                .timestep_fs
                .ok_or(ConfigError::MissingParameter("timestep_fs"))?,
            ntcmdprep: self
                .ntcmdprep
                .ok_or(ConfigError::MissingParameter("ntcmdprep"))?,
            ntcmd: self.ntcmd.ok_or(ConfigError::MissingParameter("ntcmd"))?,
            ntebprep: self
                .ntebprep
                .ok_or(ConfigError::MissingParameter("ntebprep"))?,
            nteb: self.nteb.ok_or(ConfigError::MissingParameter("nteb"))?,
            total_steps: self
                .total_steps
                .ok_or(ConfigError::MissingParameter("total_steps"))?,
            chunk_size: self
                .chunk_size
                .ok_or(ConfigError::MissingParameter("chunk_size"))?,
            checkpoint_frequency: self
                .checkpoint_frequency
                .ok_or(ConfigError::MissingParameter("checkpoint_frequency"))?,
            snapshot_frequency: self
                .snapshot_frequency
                .ok_or(ConfigError::MissingParameter("snapshot_frequency"))?,
            output_directory: self
                .output_directory
                .ok_or(ConfigError::MissingParameter("output_directory"))?,
            overwrite_output: self.overwrite_output,
            boost_variant: self.boost_variant.unwrap_or(BoostVariant::LowerTotal),
            sigma0: self.sigma0.unwrap_or_else(default_sigma0),
            random_seed: self.random_seed.unwrap_or_else(default_seed),
            energy_reporter_frequency: self
                .energy_reporter_frequency
                .unwrap_or_else(default_reporter_frequency),
            coordinates_reporter_frequency: self
                .coordinates_reporter_frequency
                .unwrap_or_else(default_reporter_frequency),
            coordinates_reporter_file_type: self
                .coordinates_reporter_file_type
                .unwrap_or_else(default_file_type),
        };
        config.validate()?;
        Ok(config)
    }
}
