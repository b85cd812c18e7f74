//! Rolling-checkpoint persistence and step-indexed snapshot persistence.
//!
//! Exactly one rolling checkpoint file exists at any time; it is overwritten
//! at the checkpoint cadence and is the sole source of restart state. The
//! overwrite is atomic (write to a sibling temporary file, then rename), so
//! a crash mid-save can never leave a truncated blob as the only way back
//! into a multi-day run. Snapshots are the opposite: step-indexed, never
//! overwritten, and useless for resuming; they exist for offline analysis.

use crate::engine::SimulationEngine;
use crate::runner::artifacts::OutputLayout;
use crate::runner::error::RunnerError;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CheckpointManager {
    rolling_path: PathBuf,
}

impl CheckpointManager {
    pub fn new(rolling_path: PathBuf) -> Self {
        Self { rolling_path }
    }

    pub fn rolling_path(&self) -> &std::path::Path {
        &self.rolling_path
    }

    /// Overwrite the rolling checkpoint with the engine's current state.
    pub fn save(&self, engine: &dyn SimulationEngine) -> Result<(), RunnerError> {
        let blob = engine.save_checkpoint()?;
        let tmp = self.rolling_path.with_extension("backup.tmp");
        fs::write(&tmp, &blob)?;
        fs::rename(&tmp, &self.rolling_path)?;
        debug!(
            step = engine.current_step(),
            bytes = blob.len(),
            "Rolling checkpoint saved"
        );
        Ok(())
    }

    /// Load the rolling checkpoint into the engine and report the absolute
    /// step it represents. The step comes from the engine's own internal
    /// counter, never from file naming: the rolling file carries no suffix.
    pub fn restore(&self, engine: &mut dyn SimulationEngine) -> Result<u64, RunnerError> {
        let blob = fs::read(&self.rolling_path)?;
        engine.load_checkpoint(&blob)?;
        let step = engine.current_step();
        debug!(step, "Rolling checkpoint restored");
        Ok(step)
    }

    /// Persist the durable, step-indexed snapshot triple: state file,
    /// checkpoint copy, position export. Distinct `step` values never
    /// collide, so snapshots accumulate safely across restarts.
    pub fn save_snapshot(
        &self,
        engine: &dyn SimulationEngine,
        step: u64,
        layout: &OutputLayout,
    ) -> Result<(), RunnerError> {
        engine.save_state(&layout.state_snapshot(step))?;
        fs::write(layout.checkpoint_snapshot(step), engine.save_checkpoint()?)?;
        engine.export_positions(&layout.positions_snapshot(step))?;
        debug!(step, "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoostVariant;
    use crate::engine::langevin::LangevinBoostEngine;
    use crate::runner::config::{SimulationConfig, SimulationConfigBuilder};

    fn config(dir: &std::path::Path) -> SimulationConfig {
        SimulationConfigBuilder::new()
            .temperature(300.0)
            .timestep_fs(2.0)
            .ntcmdprep(100)
            .ntcmd(400)
            .ntebprep(100)
            .nteb(400)
            .total_steps(1_000)
            .chunk_size(50)
            .checkpoint_frequency(100)
            .snapshot_frequency(200)
            .output_directory(dir)
            .boost_variant(BoostVariant::LowerTotal)
            .build()
            .unwrap()
    }

    #[test]
    fn save_then_restore_recovers_the_engine_step() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let manager = CheckpointManager::new(dir.path().join("gamd.backup"));

        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(300).unwrap();
        manager.save(&engine).unwrap();

        let mut fresh = LangevinBoostEngine::new(&config);
        let step = manager.restore(&mut fresh).unwrap();
        assert_eq!(step, 300);
        assert_eq!(fresh.current_step(), 300);
        assert_eq!(fresh.diagnostics(), engine.diagnostics());
    }

    #[test]
    fn rolling_save_overwrites_in_place_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let manager = CheckpointManager::new(dir.path().join("gamd.backup"));

        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(100).unwrap();
        manager.save(&engine).unwrap();
        engine.advance(100).unwrap();
        manager.save(&engine).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["gamd.backup".to_string()]);

        let mut restored = LangevinBoostEngine::new(&config);
        assert_eq!(manager.restore(&mut restored).unwrap(), 200);
    }

    #[test]
    fn snapshots_are_step_indexed_and_cumulative() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let layout = OutputLayout::new(dir.path());
        layout.prepare(true).unwrap();
        let manager = CheckpointManager::new(layout.rolling_checkpoint());

        let mut engine = LangevinBoostEngine::new(&config);
        engine.advance(200).unwrap();
        manager.save_snapshot(&engine, 200, &layout).unwrap();
        engine.advance(200).unwrap();
        manager.save_snapshot(&engine, 400, &layout).unwrap();

        for step in [200, 400] {
            assert!(layout.state_snapshot(step).is_file());
            assert!(layout.checkpoint_snapshot(step).is_file());
            assert!(layout.positions_snapshot(step).is_file());
        }
    }

    #[test]
    fn restore_fails_cleanly_when_no_checkpoint_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let manager = CheckpointManager::new(dir.path().join("gamd.backup"));
        let mut engine = LangevinBoostEngine::new(&config);
        assert!(matches!(
            manager.restore(&mut engine),
            Err(RunnerError::Io(_))
        ));
    }
}
