use super::SimulationEngine;
use super::langevin::LangevinBoostEngine;
use crate::runner::config::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of boost formulations an engine can be built with.
///
/// The names match the boost-type strings accepted by the original test
/// driver (`lower-total`, `upper-dihedral`, ...). `ConventionalCmd` runs
/// plain conventional MD and never applies a boost; it exists to generate
/// unbiased baselines to compare the boosted variants against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoostVariant {
    #[serde(rename = "gamd-cmd-base")]
    ConventionalCmd,
    LowerTotal,
    UpperTotal,
    LowerDihedral,
    UpperDihedral,
}

impl BoostVariant {
    pub const ALL: [BoostVariant; 5] = [
        BoostVariant::ConventionalCmd,
        BoostVariant::LowerTotal,
        BoostVariant::UpperTotal,
        BoostVariant::LowerDihedral,
        BoostVariant::UpperDihedral,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BoostVariant::ConventionalCmd => "gamd-cmd-base",
            BoostVariant::LowerTotal => "lower-total",
            BoostVariant::UpperTotal => "upper-total",
            BoostVariant::LowerDihedral => "lower-dihedral",
            BoostVariant::UpperDihedral => "upper-dihedral",
        }
    }

    /// Whether the boost is applied to the full potential or only to the
    /// dihedral force class.
    pub fn boosts_total(&self) -> bool {
        matches!(self, BoostVariant::LowerTotal | BoostVariant::UpperTotal)
    }

    /// Whether the boost threshold energy sits at the upper bound of the
    /// sampled energy range.
    pub fn upper_bound(&self) -> bool {
        matches!(self, BoostVariant::UpperTotal | BoostVariant::UpperDihedral)
    }
}

impl Default for BoostVariant {
    fn default() -> Self {
        BoostVariant::LowerTotal
    }
}

impl fmt::Display for BoostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoostVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoostVariant::ALL
            .iter()
            .find(|v| v.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown boost variant '{}'", s))
    }
}

/// Construct the engine for the variant named in the config. The runner
/// depends only on the returned trait object, never on a concrete engine.
pub fn build_engine(config: &SimulationConfig) -> Box<dyn SimulationEngine> {
    Box::new(LangevinBoostEngine::new(config))
}
