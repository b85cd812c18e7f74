//! Pure mapping from cumulative step count to the named stage of a
//! bias-accelerated run. Used for logging and observability only; the
//! estimation-vs-application logic itself lives inside the engine.

use crate::runner::config::SimulationConfig;

/// Named phase of a staged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Conventional MD, statistics not yet collected.
    CmdPrep,
    /// Conventional MD, potential statistics being collected.
    Cmd,
    /// Boost applied, parameters not yet trusted.
    EbPrep,
    /// Boost applied, parameters still adapting.
    Eb,
    /// Boost frozen.
    Production,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::CmdPrep => "cmd-prep",
            Stage::Cmd => "cmd",
            Stage::EbPrep => "eb-prep",
            Stage::Eb => "eb",
            Stage::Production => "production",
        }
    }
}

/// Monotonically increasing stage boundaries, derived once from the config.
///
/// `ntcmd` and `nteb` are cumulative within their phase (prep included), as
/// in the conventional input convention: the CMD phase spans `(0, ntcmd]`
/// with its first `ntcmdprep` steps being preparation, and the EB phase spans
/// `(ntcmd, ntcmd + nteb]` likewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSchedule {
    cmd_prep_end: u64,
    cmd_end: u64,
    eb_prep_end: u64,
    eb_end: u64,
    production_end: u64,
}

impl StageSchedule {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            cmd_prep_end: config.ntcmdprep,
            cmd_end: config.ntcmd,
            eb_prep_end: config.ntcmd + config.ntebprep,
            eb_end: config.ntcmd + config.nteb,
            production_end: config.total_steps,
        }
    }

    /// Stage containing `step`. Steps beyond the last boundary report
    /// `Production`, so a run lengthened engine-side still classifies.
    pub fn stage_for(&self, step: u64) -> Stage {
        if step <= self.cmd_prep_end {
            Stage::CmdPrep
        } else if step <= self.cmd_end {
            Stage::Cmd
        } else if step <= self.eb_prep_end {
            Stage::EbPrep
        } else if step <= self.eb_end {
            Stage::Eb
        } else {
            Stage::Production
        }
    }

    pub fn production_end(&self) -> u64 {
        self.production_end
    }
}
