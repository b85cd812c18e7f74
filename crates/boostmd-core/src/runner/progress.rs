use crate::runner::stage::Stage;

/// Observability events emitted by the chunk loop, for CLI display.
#[derive(Debug, Clone)]
pub enum Progress {
    RunStart { total_chunks: u64, start_chunk: u64 },
    ChunkFinish { chunk: u64, step: u64, stage: Stage },
    CheckpointSaved { step: u64 },
    SnapshotSaved { step: u64 },
    RunFinish,
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
