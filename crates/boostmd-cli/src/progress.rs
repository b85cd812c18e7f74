use boostmd::runner::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Renders the runner's per-chunk progress events as an indicatif bar on
/// stderr, one tick per completed chunk.
#[derive(Clone)]
pub struct ChunkProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl ChunkProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::hidden();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let pb_handle = self.pb.clone();

        Box::new(move |event: Progress| {
            let Ok(pb) = pb_handle.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match event {
                Progress::RunStart {
                    total_chunks,
                    start_chunk,
                } => {
                    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                    pb.set_style(Self::bar_style());
                    pb.set_length(total_chunks);
                    pb.set_position(start_chunk.saturating_sub(1));
                }
                Progress::ChunkFinish { chunk, stage, .. } => {
                    pb.set_position(chunk);
                    pb.set_message(stage.name());
                }
                Progress::CheckpointSaved { step } => {
                    pb.println(format!("  checkpoint saved at step {}", step));
                }
                Progress::SnapshotSaved { step } => {
                    pb.println(format!("  snapshot saved at step {}", step));
                }
                Progress::RunFinish => {
                    pb.finish_with_message("done");
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<12} [{bar:40.cyan/blue}] chunk {pos}/{len} ({elapsed})",
        )
        .expect("Failed to create bar style template")
        .progress_chars("##-")
    }
}

impl Default for ChunkProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boostmd::runner::stage::Stage;

    #[test]
    fn callback_tracks_chunk_positions() {
        let handler = ChunkProgressHandler::new();
        let callback = handler.callback();

        callback(Progress::RunStart {
            total_chunks: 30,
            start_chunk: 1,
        });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(30));
            assert_eq!(pb.position(), 0);
        }

        callback(Progress::ChunkFinish {
            chunk: 7,
            step: 700,
            stage: Stage::Cmd,
        });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.position(), 7);
            assert_eq!(pb.message(), "cmd");
        }

        callback(Progress::RunFinish);
        assert!(handler.pb.lock().unwrap().is_finished());
    }

    #[test]
    fn restart_resumes_the_bar_mid_run() {
        let handler = ChunkProgressHandler::new();
        let callback = handler.callback();
        callback(Progress::RunStart {
            total_chunks: 30,
            start_chunk: 15,
        });
        assert_eq!(handler.pb.lock().unwrap().position(), 14);
    }
}
