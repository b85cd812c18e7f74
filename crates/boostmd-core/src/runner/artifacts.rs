//! Output directory layout: creation/destruction of the tree on fresh runs,
//! and resolution of every artifact path, including the restart-indexed
//! trajectory and state-data names.
//!
//! Layout under the output directory:
//!
//! ```text
//! gamd.log                         per-chunk energy log, append-only
//! gamd.backup                      rolling checkpoint, overwritten in place
//! output[.restartN].<ext>          trajectory, one file per process
//! state-data[.restartN].log        engine-native state reporter
//! states/                          human-inspectable snapshots, step-indexed
//! positions/coordinates-<step>.csv position exports
//! checkpoints/<step>.bin           step-indexed checkpoint copies
//! pdb/                             reserved for structure exports
//! ```

use crate::runner::error::RunnerError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PRIMARY_LOG: &str = "gamd.log";
const ROLLING_CHECKPOINT: &str = "gamd.backup";
const STATE_DATA_PREFIX: &str = "state-data";
const SUBDIRECTORIES: [&str; 4] = ["states", "positions", "pdb", "checkpoints"];

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the directory tree for a fresh run.
    ///
    /// With `overwrite` the previous tree is removed recursively first;
    /// without it, a pre-existing directory is an error raised before any
    /// mutation, so stale results are never silently mixed with new ones.
    pub fn prepare(&self, overwrite: bool) -> Result<(), RunnerError> {
        if self.root.exists() {
            if !overwrite {
                return Err(RunnerError::OutputDirectoryExists {
                    path: self.root.clone(),
                });
            }
            info!("Overwrite enabled, deleting old output directory {:?}", self.root);
            fs::remove_dir_all(&self.root)?;
        }

        create_dir_0755(&self.root)?;
        for sub in SUBDIRECTORIES {
            create_dir_0755(&self.root.join(sub))?;
        }
        debug!("Created output tree under {:?}", self.root);
        Ok(())
    }

    /// Restart runs never create anything: a missing directory means lost
    /// history and must surface as a configuration error.
    pub fn require_existing(&self) -> Result<(), RunnerError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(RunnerError::OutputDirectoryMissing {
                path: self.root.clone(),
            })
        }
    }

    /// Index for the next restart, derived from how many restart-indexed
    /// state-data logs already exist. Non-contiguous deletion of old restart
    /// files can make this collide with a prior index; that risk is accepted
    /// and documented rather than detected.
    pub fn next_restart_index(&self) -> Result<usize, RunnerError> {
        let mut count = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("state-data.restart") && name.ends_with(".log") {
                count += 1;
            }
        }
        Ok(count + 1)
    }

    pub fn primary_log(&self) -> PathBuf {
        self.root.join(PRIMARY_LOG)
    }

    pub fn rolling_checkpoint(&self) -> PathBuf {
        self.root.join(ROLLING_CHECKPOINT)
    }

    /// `output.<ext>` fresh, `output.restartN.<ext>` on the Nth restart.
    pub fn trajectory(&self, restart_index: Option<usize>, extension: &str) -> PathBuf {
        match restart_index {
            None => self.root.join(format!("output.{}", extension)),
            Some(n) => self.root.join(format!("output.restart{}.{}", n, extension)),
        }
    }

    /// `state-data.log` fresh, `state-data.restartN.log` on the Nth restart.
    pub fn state_data_log(&self, restart_index: Option<usize>) -> PathBuf {
        match restart_index {
            None => self.root.join(format!("{}.log", STATE_DATA_PREFIX)),
            Some(n) => self
                .root
                .join(format!("{}.restart{}.log", STATE_DATA_PREFIX, n)),
        }
    }

    pub fn initial_state(&self) -> PathBuf {
        self.root.join("states").join("initial-state.toml")
    }

    pub fn state_snapshot(&self, step: u64) -> PathBuf {
        self.root.join("states").join(format!("{}.toml", step))
    }

    pub fn checkpoint_snapshot(&self, step: u64) -> PathBuf {
        self.root.join("checkpoints").join(format!("{}.bin", step))
    }

    pub fn positions_snapshot(&self, step: u64) -> PathBuf {
        self.root
            .join("positions")
            .join(format!("coordinates-{}.csv", step))
    }
}

#[cfg(unix)]
fn create_dir_0755(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_dir_0755(path: &Path) -> std::io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_the_full_tree() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        layout.prepare(false).unwrap();
        for sub in SUBDIRECTORIES {
            assert!(layout.root().join(sub).is_dir(), "missing {}", sub);
        }
    }

    #[test]
    fn prepare_refuses_existing_directory_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("gamd.log"), "old data").unwrap();

        let layout = OutputLayout::new(&root);
        let result = layout.prepare(false);
        assert!(matches!(
            result,
            Err(RunnerError::OutputDirectoryExists { .. })
        ));
        // The refusal must not have touched the previous contents.
        assert_eq!(fs::read_to_string(root.join("gamd.log")).unwrap(), "old data");
    }

    #[test]
    fn prepare_with_overwrite_replaces_previous_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        fs::create_dir_all(root.join("states")).unwrap();
        fs::write(root.join("states").join("100.toml"), "stale").unwrap();

        let layout = OutputLayout::new(&root);
        layout.prepare(true).unwrap();
        assert!(!root.join("states").join("100.toml").exists());
        for sub in SUBDIRECTORIES {
            assert!(root.join(sub).is_dir());
        }
    }

    #[test]
    fn restart_index_counts_existing_state_data_restart_logs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        assert_eq!(layout.next_restart_index().unwrap(), 1);

        fs::write(dir.path().join("state-data.log"), "").unwrap();
        assert_eq!(layout.next_restart_index().unwrap(), 1);

        fs::write(dir.path().join("state-data.restart1.log"), "").unwrap();
        fs::write(dir.path().join("state-data.restart2.log"), "").unwrap();
        assert_eq!(layout.next_restart_index().unwrap(), 3);
    }

    #[test]
    fn restart_indexed_names_follow_the_convention() {
        let layout = OutputLayout::new("/data/run");
        assert_eq!(
            layout.trajectory(None, "csv"),
            PathBuf::from("/data/run/output.csv")
        );
        assert_eq!(
            layout.trajectory(Some(2), "csv"),
            PathBuf::from("/data/run/output.restart2.csv")
        );
        assert_eq!(
            layout.state_data_log(Some(2)),
            PathBuf::from("/data/run/state-data.restart2.log")
        );
        assert_eq!(
            layout.positions_snapshot(5_000),
            PathBuf::from("/data/run/positions/coordinates-5000.csv")
        );
    }

    #[test]
    fn missing_directory_is_a_restart_error() {
        let layout = OutputLayout::new("/nonexistent/boostmd-test");
        assert!(matches!(
            layout.require_existing(),
            Err(RunnerError::OutputDirectoryMissing { .. })
        ));
    }
}
