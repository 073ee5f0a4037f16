//! JSON checkpoints of pipeline runs, used by replay.

use crate::context::PipelineContext;
use copyforge_core::error::PipelineError;
use std::path::{Path, PathBuf};
use tracing::debug;

const LATEST: &str = "latest.json";

/// Saves each run's context under `<state_dir>/runs`.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: state_dir.as_ref().join("runs"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the context to `<run_id>.json` and `latest.json`.
    pub fn save(&self, ctx: &PipelineContext) -> Result<PathBuf, PipelineError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PipelineError::Checkpoint(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let json = serde_json::to_string_pretty(ctx)
            .map_err(|e| PipelineError::Checkpoint(format!("Failed to serialize run: {e}")))?;

        let path = self.dir.join(format!("{}.json", ctx.run_id));
        for target in [&path, &self.dir.join(LATEST)] {
            std::fs::write(target, &json).map_err(|e| {
                PipelineError::Checkpoint(format!("Failed to write {}: {e}", target.display()))
            })?;
        }

        debug!(run_id = %ctx.run_id, stages = ctx.outputs.len(), path = %path.display(), "Checkpoint saved");
        Ok(path)
    }

    pub fn load(&self, run_id: &str) -> Result<PipelineContext, PipelineError> {
        self.read(&self.dir.join(format!("{run_id}.json")))
    }

    /// The most recently saved run.
    pub fn load_latest(&self) -> Result<PipelineContext, PipelineError> {
        self.read(&self.dir.join(LATEST))
    }

    fn read(&self, path: &Path) -> Result<PipelineContext, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Checkpoint(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PipelineError::Checkpoint(format!("Invalid checkpoint {}: {e}", path.display()))
        })
    }
}
