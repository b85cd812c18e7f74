//! Deterministic reference engine: a single particle in a three-dimensional
//! well, integrated by a seeded Langevin scheme with Gaussian-accelerated
//! boost bookkeeping.
//!
//! The model potential is a harmonic well plus a periodic term in `x` that
//! stands in for the dihedral force class:
//!
//! ```text
//! V(r) = 1/2 k |r|^2  +  B (1 - cos x)
//! ```
//!
//! Boost parameters follow the standard Gaussian-accelerated scheme: during
//! the conventional-MD stages the engine accumulates potential-energy
//! statistics (max, min, mean, sigma); during the equilibration stages it
//! derives a threshold energy `E` and a harmonic constant `k0` from those
//! statistics (lower- or upper-bound form depending on the variant) and
//! applies the boost `dV = k0 (E - V)^2 / (2 (Vmax - Vmin))` whenever the
//! instantaneous potential falls below `E`; in production the parameters are
//! frozen. All mutable state, including the RNG, serializes into the
//! checkpoint blob, so a restored run continues bit-exactly.

use super::{EnergyReport, EngineError, ReporterSpec, SimulationEngine, StepFault};
use crate::engine::BoostVariant;
use crate::runner::config::SimulationConfig;
use crate::runner::stage::{Stage, StageSchedule};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Boltzmann constant in kJ/(mol K).
const KB: f64 = 0.008_314_462_618;
/// Spring constant of the harmonic well, kJ/(mol nm^2).
const WELL_K: f64 = 120.0;
/// Height of the periodic (dihedral-like) term, kJ/mol.
const DIHEDRAL_BARRIER: f64 = 12.0;
/// Langevin friction, 1/ps.
const FRICTION: f64 = 1.0;
/// Particle mass, amu-equivalent.
const MASS: f64 = 12.0;

/// Running min/max/mean/variance of a sampled energy, Welford form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnergyStatistics {
    count: u64,
    max: f64,
    min: f64,
    mean: f64,
    m2: f64,
}

impl Default for EnergyStatistics {
    fn default() -> Self {
        Self {
            count: 0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }
}

impl EnergyStatistics {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.max = self.max.max(value);
        self.min = self.min.min(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn sigma(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    fn ready(&self) -> bool {
        self.count >= 2 && self.max > self.min
    }
}

/// Threshold energy and harmonic constant of an active boost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BoostParameters {
    threshold: f64,
    k0: f64,
    /// Effective constant `k0 / (Vmax - Vmin)`.
    k: f64,
}

impl BoostParameters {
    fn from_statistics(stats: &EnergyStatistics, sigma0: f64, upper_bound: bool) -> Option<Self> {
        if !stats.ready() {
            return None;
        }
        let spread = stats.max - stats.min;
        let sigma_v = stats.sigma();
        if sigma_v <= 0.0 {
            return None;
        }

        let (threshold, k0) = if upper_bound {
            let k0_prime = (1.0 - sigma0 / sigma_v) * spread / (stats.mean - stats.min);
            if k0_prime > 0.0 && k0_prime < 1.0 {
                (stats.min + spread / k0_prime, k0_prime)
            } else {
                (stats.max, 1.0)
            }
        } else {
            let k0 = (sigma0 / sigma_v) * spread / (stats.max - stats.mean);
            (stats.max, k0.min(1.0))
        };

        Some(Self {
            threshold,
            k0,
            k: k0 / spread,
        })
    }

    /// Boost energy and force scale for the instantaneous potential `v`.
    fn apply(&self, v: f64) -> (f64, f64) {
        if v < self.threshold {
            let dv = 0.5 * self.k * (self.threshold - v) * (self.threshold - v);
            let scale = 1.0 - self.k * (self.threshold - v);
            (dv, scale.max(0.0))
        } else {
            (0.0, 1.0)
        }
    }
}

/// Everything that must survive a checkpoint round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineState {
    step: u64,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    rng: ChaCha8Rng,
    total_stats: EnergyStatistics,
    dihedral_stats: EnergyStatistics,
    boost: Option<BoostParameters>,
    report: EnergyReport,
}

struct Reporters {
    trajectory: csv::Writer<File>,
    state_log: BufWriter<File>,
    energy_frequency: u64,
    coordinate_frequency: u64,
}

/// Human-inspectable snapshot document written by [`SimulationEngine::save_state`].
#[derive(Debug, Serialize)]
struct StateDocument {
    step: u64,
    stage: String,
    position: [f64; 3],
    velocity: [f64; 3],
    potential_energy: f64,
    dihedral_energy: f64,
    boost_potential: f64,
    boost_threshold: Option<f64>,
    boost_k0: Option<f64>,
}

pub struct LangevinBoostEngine {
    variant: BoostVariant,
    schedule: StageSchedule,
    total_steps: u64,
    timestep_ps: f64,
    temperature: f64,
    sigma0: f64,
    state: EngineState,
    reporters: Option<Reporters>,
}

impl LangevinBoostEngine {
    pub fn new(config: &SimulationConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);
        // Start displaced from the minimum so the first chunks sample a
        // non-trivial energy range.
        let position = Vector3::new(1.2, 0.4, -0.3);
        let sigma_v = (KB * config.temperature / MASS).sqrt();
        let velocity = Vector3::new(
            sigma_v * standard_normal(&mut rng),
            sigma_v * standard_normal(&mut rng),
            sigma_v * standard_normal(&mut rng),
        );

        let mut state = EngineState {
            step: 0,
            position,
            velocity,
            rng,
            total_stats: EnergyStatistics::default(),
            dihedral_stats: EnergyStatistics::default(),
            boost: None,
            report: EnergyReport {
                total_force_scale: 1.0,
                dihedral_force_scale: 1.0,
                ..EnergyReport::default()
            },
        };
        let (potential, dihedral) = potential_terms(&state.position);
        state.report.potential_energy = potential + dihedral;
        state.report.dihedral_energy = dihedral;

        Self {
            variant: config.boost_variant,
            schedule: StageSchedule::from_config(config),
            total_steps: config.total_steps,
            timestep_ps: config.timestep_fs * 1.0e-3,
            temperature: config.temperature,
            sigma0: config.sigma0,
            state,
            reporters: None,
        }
    }

    fn stage(&self) -> Stage {
        self.schedule.stage_for(self.state.step)
    }

    /// Energy the boost acts on for this variant.
    fn boosted_energy(&self, total: f64, dihedral: f64) -> f64 {
        if self.variant.boosts_total() { total } else { dihedral }
    }

    fn refresh_boost_parameters(&mut self) {
        if self.variant == BoostVariant::ConventionalCmd {
            return;
        }
        let stats = if self.variant.boosts_total() {
            &self.state.total_stats
        } else {
            &self.state.dihedral_stats
        };
        if let Some(params) =
            BoostParameters::from_statistics(stats, self.sigma0, self.variant.upper_bound())
        {
            self.state.boost = Some(params);
        }
    }

    fn step_once(&mut self) -> Result<(), StepFault> {
        let stage = self.stage();
        let (harmonic, dihedral) = potential_terms(&self.state.position);
        let total = harmonic + dihedral;

        if !total.is_finite() {
            return Err(StepFault::NonFiniteEnergy {
                step: self.state.step,
            });
        }

        // Statistics accumulate through every stage before production, as the
        // boost parameters keep adapting until the equilibration stages end.
        if stage != Stage::Production {
            self.state.total_stats.record(total);
            self.state.dihedral_stats.record(dihedral);
        }

        let boosting = matches!(stage, Stage::EbPrep | Stage::Eb | Stage::Production);
        if matches!(stage, Stage::EbPrep | Stage::Eb) {
            self.refresh_boost_parameters();
        }

        let (boost_energy, scale) = match (&self.state.boost, boosting) {
            (Some(params), true) => params.apply(self.boosted_energy(total, dihedral)),
            _ => (0.0, 1.0),
        };

        let (total_scale, dihedral_scale) = if self.variant.boosts_total() {
            (scale, scale)
        } else {
            (1.0, scale)
        };

        self.state.report = EnergyReport {
            potential_energy: total,
            dihedral_energy: dihedral,
            total_force_scale: total_scale,
            dihedral_force_scale: dihedral_scale,
            boost_potential: if self.variant.boosts_total() {
                boost_energy
            } else {
                0.0
            },
            dihedral_boost: if self.variant.boosts_total() {
                0.0
            } else {
                boost_energy
            },
        };

        // Forces, with the boost scale applied to the relevant class.
        let mut force = -WELL_K * self.state.position * total_scale;
        force.x -= DIHEDRAL_BARRIER * self.state.position.x.sin() * dihedral_scale;

        // Euler-Maruyama Langevin update, fully determined by the seeded RNG.
        let dt = self.timestep_ps;
        let damp = (-FRICTION * dt).exp();
        let noise = (KB * self.temperature / MASS * (1.0 - damp * damp)).sqrt();
        let rng = &mut self.state.rng;
        let kick = Vector3::new(
            standard_normal(rng),
            standard_normal(rng),
            standard_normal(rng),
        );
        self.state.velocity = self.state.velocity * damp + force / MASS * dt + noise * kick;
        self.state.position += self.state.velocity * dt;
        self.state.step += 1;

        if !self.state.position.iter().all(|c| c.is_finite()) {
            return Err(StepFault::NonFiniteEnergy {
                step: self.state.step,
            });
        }

        self.write_reporter_rows()?;
        Ok(())
    }

    fn write_reporter_rows(&mut self) -> Result<(), StepFault> {
        let Some(reporters) = self.reporters.as_mut() else {
            return Ok(());
        };
        let step = self.state.step;
        let report = self.state.report;

        let io_fault = |e: std::io::Error| StepFault::Other {
            step,
            reason: format!("reporter write failed: {}", e),
        };

        if step % reporters.energy_frequency == 0 {
            let kinetic = 0.5 * MASS * self.state.velocity.norm_squared();
            let instantaneous_t = 2.0 * kinetic / (3.0 * KB);
            writeln!(
                reporters.state_log,
                "{},{:.6},{:.6},{:.6},{:.6}",
                step,
                instantaneous_t,
                report.potential_energy,
                report.potential_energy + kinetic,
                report.boost_potential + report.dihedral_boost,
            )
            .map_err(io_fault)?;
            reporters.state_log.flush().map_err(io_fault)?;
        }

        if step % reporters.coordinate_frequency == 0 {
            reporters
                .trajectory
                .serialize((
                    step,
                    self.state.position.x,
                    self.state.position.y,
                    self.state.position.z,
                ))
                .and_then(|_| reporters.trajectory.flush().map_err(csv::Error::from))
                .map_err(|e| StepFault::Other {
                    step,
                    reason: format!("trajectory write failed: {}", e),
                })?;
        }
        Ok(())
    }
}

impl SimulationEngine for LangevinBoostEngine {
    fn total_steps(&self) -> u64 {
        self.total_steps
    }

    fn current_step(&self) -> u64 {
        self.state.step
    }

    fn advance(&mut self, steps: u64) -> Result<(), StepFault> {
        for _ in 0..steps {
            self.step_once()?;
        }
        Ok(())
    }

    fn diagnostics(&self) -> EnergyReport {
        self.state.report
    }

    fn save_checkpoint(&self) -> Result<Vec<u8>, EngineError> {
        Ok(postcard::to_allocvec(&self.state)?)
    }

    fn load_checkpoint(&mut self, blob: &[u8]) -> Result<(), EngineError> {
        self.state = postcard::from_bytes(blob)?;
        Ok(())
    }

    fn save_state(&self, path: &Path) -> Result<(), EngineError> {
        let doc = StateDocument {
            step: self.state.step,
            stage: format!("{:?}", self.stage()),
            position: self.state.position.into(),
            velocity: self.state.velocity.into(),
            potential_energy: self.state.report.potential_energy,
            dihedral_energy: self.state.report.dihedral_energy,
            boost_potential: self.state.report.boost_potential + self.state.report.dihedral_boost,
            boost_threshold: self.state.boost.map(|b| b.threshold),
            boost_k0: self.state.boost.map(|b| b.k0),
        };
        std::fs::write(path, toml::to_string_pretty(&doc)?)?;
        Ok(())
    }

    fn export_positions(&self, path: &Path) -> Result<(), EngineError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["particle", "x", "y", "z"])?;
        writer.serialize((
            0u32,
            self.state.position.x,
            self.state.position.y,
            self.state.position.z,
        ))?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn attach_reporters(&mut self, spec: &ReporterSpec) -> Result<(), EngineError> {
        let mut state_log = BufWriter::new(File::create(&spec.state_log_path)?);
        writeln!(
            state_log,
            "#Step,Temperature (K),Potential Energy (kJ/mole),Total Energy (kJ/mole),Boost (kJ/mole)"
        )?;
        let mut trajectory = csv::Writer::from_path(&spec.trajectory_path)?;
        trajectory.write_record(["step", "x", "y", "z"])?;
        self.reporters = Some(Reporters {
            trajectory,
            state_log,
            energy_frequency: spec.energy_frequency.max(1),
            coordinate_frequency: spec.coordinate_frequency.max(1),
        });
        Ok(())
    }
}

fn potential_terms(position: &Vector3<f64>) -> (f64, f64) {
    let harmonic = 0.5 * WELL_K * position.norm_squared();
    let dihedral = DIHEDRAL_BARRIER * (1.0 - position.x.cos());
    (harmonic, dihedral)
}

/// Box-Muller draw, kept explicit so the RNG stream (and therefore every
/// trajectory) is stable across `rand` distribution changes.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::config::SimulationConfigBuilder;

    fn test_config() -> SimulationConfig {
        SimulationConfigBuilder::new()
            .temperature(300.0)
            .timestep_fs(2.0)
            .ntcmdprep(200)
            .ntcmd(1000)
            .ntebprep(200)
            .nteb(1000)
            .total_steps(3000)
            .chunk_size(100)
            .checkpoint_frequency(500)
            .snapshot_frequency(1000)
            .output_directory("unused")
            .boost_variant(BoostVariant::LowerTotal)
            .build()
            .unwrap()
    }

    #[test]
    fn identical_seeds_produce_identical_trajectories() {
        let config = test_config();
        let mut a = LangevinBoostEngine::new(&config);
        let mut b = LangevinBoostEngine::new(&config);
        a.advance(500).unwrap();
        b.advance(500).unwrap();
        assert_eq!(a.state.position, b.state.position);
        assert_eq!(a.diagnostics(), b.diagnostics());
    }

    #[test]
    fn checkpoint_round_trip_is_bit_exact() {
        let config = test_config();
        let mut reference = LangevinBoostEngine::new(&config);
        reference.advance(800).unwrap();
        let blob = reference.save_checkpoint().unwrap();

        let mut restored = LangevinBoostEngine::new(&config);
        restored.load_checkpoint(&blob).unwrap();
        assert_eq!(restored.current_step(), 800);

        reference.advance(700).unwrap();
        restored.advance(700).unwrap();
        assert_eq!(reference.state.position, restored.state.position);
        assert_eq!(reference.diagnostics(), restored.diagnostics());
    }

    #[test]
    fn conventional_variant_never_boosts() {
        let mut config = test_config();
        config.boost_variant = BoostVariant::ConventionalCmd;
        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(3000).unwrap();
        let report = engine.diagnostics();
        assert_eq!(report.boost_potential, 0.0);
        assert_eq!(report.dihedral_boost, 0.0);
        assert_eq!(report.total_force_scale, 1.0);
    }

    #[test]
    fn dihedral_variant_leaves_total_force_unscaled() {
        let mut config = test_config();
        config.boost_variant = BoostVariant::LowerDihedral;
        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(3000).unwrap();
        let report = engine.diagnostics();
        assert_eq!(report.total_force_scale, 1.0);
        assert_eq!(report.boost_potential, 0.0);
    }

    #[test]
    fn boost_parameters_are_derived_after_equilibration_begins() {
        let config = test_config();
        let mut engine = LangevinBoostEngine::new(&config);
        // Through CMD prep and CMD: statistics only, no boost yet.
        engine.advance(1000).unwrap();
        assert!(engine.state.boost.is_none());
        // Into EB prep: parameters must exist and be sane.
        engine.advance(200).unwrap();
        let params = engine.state.boost.expect("boost parameters missing");
        assert!(params.k0 > 0.0 && params.k0 <= 1.0);
        assert!(params.threshold.is_finite());
    }

    #[test]
    fn state_document_is_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(100).unwrap();
        let path = dir.path().join("state.toml");
        engine.save_state(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let doc: toml::Value = text.parse().unwrap();
        assert_eq!(doc["step"].as_integer(), Some(100));
    }
}
