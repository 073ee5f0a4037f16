//! The content crew: the stage pipeline plus the final formatting pass.

use crate::author::{LlmAuthor, StageAuthor};
use crate::checkpoint::CheckpointStore;
use crate::context::{ContentBrief, PipelineContext};
use crate::pipeline::StagePipeline;
use copyforge_config::AppConfig;
use copyforge_core::error::PipelineError;
use copyforge_core::search::SearchCollaborator;
use copyforge_providers::build_from_config;
use copyforge_reference::ReferenceStore;
use copyforge_tools::{ContentFormatter, FormatRequest, FormattedDocument, SerperClient, default_registry};
use std::sync::Arc;
use tracing::info;

/// Result of a crew run.
#[derive(Debug, Clone)]
pub struct CrewOutput {
    pub context: PipelineContext,
    pub document: FormattedDocument,
    /// The document as publishable text
    pub rendered: String,
}

pub struct ContentCrew {
    pipeline: StagePipeline,
    formatter: ContentFormatter,
    include_disclaimers: bool,
}

impl ContentCrew {
    pub fn new(pipeline: StagePipeline, formatter: ContentFormatter) -> Self {
        Self {
            pipeline,
            formatter,
            include_disclaimers: true,
        }
    }

    /// Wire the crew from configuration: Serper search, provider routing per
    /// stage, checkpoints under the state dir.
    pub fn from_config(config: &AppConfig) -> Self {
        let search = Arc::new(SerperClient::from_config(config));
        let author = Arc::new(LlmAuthor::new(build_from_config(config), &config.models));
        Self::with_parts(config, search, author)
    }

    /// Wire the crew with an explicit search collaborator and author.
    pub fn with_parts(
        config: &AppConfig,
        search: Arc<dyn SearchCollaborator>,
        author: Arc<dyn StageAuthor>,
    ) -> Self {
        let tools = Arc::new(default_registry(config, search));
        let pipeline = StagePipeline::new(tools, author)
            .with_checkpoints(CheckpointStore::new(&config.runtime.state_dir))
            .with_compliance(ReferenceStore::new(config.reference.clone()));

        Self {
            pipeline,
            formatter: ContentFormatter::from_config(&config.formatter),
            include_disclaimers: config.formatter.include_disclaimers,
        }
    }

    pub fn with_disclaimers(mut self, include: bool) -> Self {
        self.include_disclaimers = include;
        self
    }

    pub fn pipeline(&self) -> &StagePipeline {
        &self.pipeline
    }

    pub async fn kickoff(&self, brief: ContentBrief) -> Result<CrewOutput, PipelineError> {
        let context = self.pipeline.run(brief).await?;
        self.finish(context)
    }

    /// Re-run from a stage using a saved context.
    pub async fn replay(&self, selector: &str, saved: PipelineContext) -> Result<CrewOutput, PipelineError> {
        let context = self.pipeline.replay_from(selector, saved).await?;
        self.finish(context)
    }

    /// Re-run from a stage using the most recent checkpoint.
    pub async fn replay_latest(&self, selector: &str) -> Result<CrewOutput, PipelineError> {
        let store = self
            .pipeline
            .checkpoints()
            .ok_or_else(|| PipelineError::Checkpoint("Checkpoints are not enabled".into()))?;
        let saved = store.load_latest()?;
        self.replay(selector, saved).await
    }

    fn finish(&self, context: PipelineContext) -> Result<CrewOutput, PipelineError> {
        let final_text = context
            .last_output()
            .map(|o| o.text.clone())
            .ok_or_else(|| PipelineError::StageFailed {
                stage: "formatting".into(),
                reason: "pipeline produced no output".into(),
            })?;

        let brief = &context.brief;
        let mut request = FormatRequest::new(final_text)
            .content_type(&brief.content_type)
            .tone(&brief.brand.tone_of_voice)
            .audience(&brief.brand.primary_target)
            .include_disclaimers(self.include_disclaimers);
        if let Some(structure) = &brief.format_structure {
            request = request.structure(structure);
        }

        let document = self.formatter.format(&request)?;
        let rendered = document.render();

        info!(
            run_id = %context.run_id,
            sections = document.sections().len(),
            chars = rendered.len(),
            "Crew run completed"
        );

        Ok(CrewOutput {
            context,
            document,
            rendered,
        })
    }
}
