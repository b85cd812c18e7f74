//! Input-file loading: turns the positional `INPUT_FILE` into a validated
//! [`SimulationConfig`], dispatched on the `INPUT_FILE_TYPE` string.

use crate::error::{CliError, Result};
use anyhow::Context;
use boostmd::runner::SimulationConfig;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFileType {
    Toml,
}

impl FromStr for InputFileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(InputFileType::Toml),
            other => Err(format!(
                "unsupported input file type '{}' (available: toml)",
                other
            )),
        }
    }
}

pub fn load_config(path: &Path, file_type: InputFileType) -> Result<SimulationConfig> {
    debug!(?path, ?file_type, "Loading simulation input file");
    let parse = || -> anyhow::Result<SimulationConfig> {
        let text = std::fs::read_to_string(path).context("reading input file")?;
        let config = match file_type {
            InputFileType::Toml => toml::from_str(&text).context("parsing TOML input")?,
        };
        Ok(config)
    };
    let config = parse().map_err(|source| CliError::InputParsing {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(boostmd::runner::RunnerError::from)?;
    Ok(config)
}
