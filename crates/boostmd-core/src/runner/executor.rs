//! The chunk executor: drives the engine forward one chunk at a time and
//! owns every side effect around the step call.
//!
//! Ordering within a chunk is load-bearing:
//!
//! 1. at the checkpoint cadence, the rolling checkpoint is saved *before*
//!    stepping, so it always represents a chunk boundary already reached;
//! 2. the engine advances exactly one chunk and its record is appended to
//!    the energy log;
//! 3. at the snapshot cadence, the durable snapshot triple is written.
//!
//! A crash between 2 and 3 therefore loses at most the pending snapshot,
//! never a completed log line, and any interruption loses at most
//! `checkpoint_frequency` steps of progress.

use crate::engine::{ReporterSpec, SimulationEngine};
use crate::runner::artifacts::OutputLayout;
use crate::runner::checkpoint::CheckpointManager;
use crate::runner::config::SimulationConfig;
use crate::runner::error::RunnerError;
use crate::runner::log::{EnergyLog, WriteMode};
use crate::runner::progress::{Progress, ProgressReporter};
use crate::runner::stage::StageSchedule;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub start_chunk: u64,
    pub chunks_completed: u64,
    pub final_step: u64,
    /// `None` for a fresh run, `Some(n)` for the nth restart.
    pub restart_index: Option<usize>,
}

/// Owns the engine and the run configuration for the process lifetime.
pub struct Runner {
    config: SimulationConfig,
    engine: Box<dyn SimulationEngine>,
}

impl Runner {
    pub fn new(config: SimulationConfig, engine: Box<dyn SimulationEngine>) -> Self {
        Self { config, engine }
    }

    /// Execute the run to completion or to the first fatal failure.
    ///
    /// On `restart` the engine state is restored from the rolling checkpoint
    /// and all logs switch to append/indexed mode; otherwise the output tree
    /// is built and a fresh log is started. Either way the loop below is
    /// identical, which is what makes resumption indistinguishable from an
    /// uninterrupted run.
    #[instrument(skip_all, name = "chunk_run")]
    pub fn run(
        &mut self,
        restart: bool,
        reporter: &ProgressReporter,
    ) -> Result<RunSummary, RunnerError> {
        self.config.validate()?;
        let layout = OutputLayout::new(&self.config.output_directory);
        let checkpoints = CheckpointManager::new(layout.rolling_checkpoint());
        let schedule = StageSchedule::from_config(&self.config);
        let chunk_size = self.config.chunk_size;

        let (start_chunk, write_mode, restart_index) = if restart {
            layout.require_existing()?;
            let step = checkpoints.restore(self.engine.as_mut())?;
            let start_chunk = step / chunk_size + 1;
            let restart_index = layout.next_restart_index()?;
            info!(
                step,
                start_chunk, restart_index, "Restarting from rolling checkpoint"
            );
            (start_chunk, WriteMode::Append, Some(restart_index))
        } else {
            layout.prepare(self.config.overwrite_output)?;
            self.engine.save_state(&layout.initial_state())?;
            info!(output = ?layout.root(), "Starting fresh run");
            (1, WriteMode::Fresh, None)
        };

        self.engine.attach_reporters(&ReporterSpec {
            trajectory_path: layout.trajectory(
                restart_index,
                &self.config.coordinates_reporter_file_type,
            ),
            state_log_path: layout.state_data_log(restart_index),
            energy_frequency: self.config.energy_reporter_frequency,
            coordinate_frequency: self.config.coordinates_reporter_frequency,
        })?;

        // The engine's total-step count is authoritative; the config's value
        // only sized the stage schedule.
        let end_chunk = self.engine.total_steps().div_ceil(chunk_size) + 1;
        let checkpoint_cadence = self.config.checkpoint_frequency / chunk_size;
        let snapshot_cadence = self.config.snapshot_frequency / chunk_size;

        let mut log = EnergyLog::open(&layout.primary_log(), write_mode)?;
        if write_mode == WriteMode::Fresh {
            log.write_header()?;
        }

        reporter.report(Progress::RunStart {
            total_chunks: end_chunk - 1,
            start_chunk,
        });

        let mut chunks_completed = 0;
        for chunk in start_chunk..end_chunk {
            if chunk % checkpoint_cadence == 0 {
                checkpoints.save(self.engine.as_ref())?;
                reporter.report(Progress::CheckpointSaved {
                    step: self.engine.current_step(),
                });
            }

            let cumulative_step = chunk * chunk_size;
            if let Err(fault) = self.engine.advance(chunk_size) {
                // Log whatever diagnostics survived, then stop for good:
                // a faulted trajectory is not retried.
                let report = self.engine.diagnostics();
                error!(step = cumulative_step, %fault, "Simulation step failure");
                log.write_failure(cumulative_step, &report)?;
                return Err(RunnerError::StepFailure {
                    step: cumulative_step,
                    fault,
                });
            }
            let report = self.engine.diagnostics();
            log.write_record(chunk_size, cumulative_step, &report)?;

            if chunk % snapshot_cadence == 0 {
                checkpoints.save_snapshot(self.engine.as_ref(), cumulative_step, &layout)?;
                reporter.report(Progress::SnapshotSaved {
                    step: cumulative_step,
                });
            }

            reporter.report(Progress::ChunkFinish {
                chunk,
                step: cumulative_step,
                stage: schedule.stage_for(cumulative_step),
            });
            chunks_completed += 1;
        }

        reporter.report(Progress::RunFinish);
        let summary = RunSummary {
            start_chunk,
            chunks_completed,
            final_step: self.engine.current_step(),
            restart_index,
        };
        info!(
            chunks = summary.chunks_completed,
            final_step = summary.final_step,
            "Run complete"
        );
        Ok(summary)
    }
}
