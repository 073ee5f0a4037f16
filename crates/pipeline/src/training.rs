//! Training runs: repeated crew runs recorded to a JSON file.

use crate::context::{ContentBrief, StageOutput};
use crate::crew::ContentCrew;
use chrono::{DateTime, Utc};
use copyforge_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRun {
    pub iteration: u32,
    pub run_id: String,
    pub stages: Vec<StageOutput>,
    pub final_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub generated_at: DateTime<Utc>,
    pub brief: ContentBrief,
    pub iterations: u32,
    pub runs: Vec<TrainingRun>,
}

/// Run the crew `iterations` times and write every run to `path`.
pub async fn train(
    crew: &ContentCrew,
    brief: &ContentBrief,
    iterations: u32,
    path: &Path,
) -> Result<TrainingReport> {
    if iterations == 0 {
        return Err(Error::Config {
            message: "Training needs at least one iteration".into(),
        });
    }

    let mut runs = Vec::with_capacity(iterations as usize);
    for iteration in 1..=iterations {
        info!(iteration, iterations, "Training iteration started");
        let output = crew.kickoff(brief.clone()).await?;
        runs.push(TrainingRun {
            iteration,
            run_id: output.context.run_id.clone(),
            stages: output.context.outputs,
            final_content: output.rendered,
        });
    }

    let report = TrainingReport {
        generated_at: Utc::now(),
        brief: brief.clone(),
        iterations,
        runs,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Internal(format!("Failed to create {}: {e}", parent.display())))?;
    }
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)
        .map_err(|e| Error::Internal(format!("Failed to write {}: {e}", path.display())))?;

    info!(iterations, path = %path.display(), "Training report written");
    Ok(report)
}
