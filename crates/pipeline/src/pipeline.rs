//! The sequential stage pipeline.
//!
//! Stages run one after another in registry order. Each stage sees the full
//! context accumulated so far, gathers evidence through its tools, asks its
//! author for a text artifact, and appends exactly one output before the
//! next stage starts. A failing stage aborts the run; retries live inside
//! the tools, never here.

use crate::author::{StageAuthor, StagePrompt};
use crate::checkpoint::CheckpointStore;
use crate::context::{ContentBrief, PipelineContext, StageOutput, ToolUsage};
use crate::stage::{Capability, StageDescriptor, default_stages, resolve_stage};
use chrono::Utc;
use copyforge_core::error::PipelineError;
use copyforge_core::tool::{ToolCall, ToolRegistry};
use copyforge_reference::{Category, ReferenceStore};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct StagePipeline {
    stages: Vec<StageDescriptor>,
    tools: Arc<ToolRegistry>,
    author: Arc<dyn StageAuthor>,
    checkpoints: Option<CheckpointStore>,
    compliance: Option<ReferenceStore>,
}

impl StagePipeline {
    /// A pipeline over the default six stages.
    pub fn new(tools: Arc<ToolRegistry>, author: Arc<dyn StageAuthor>) -> Self {
        Self {
            stages: default_stages(),
            tools,
            author,
            checkpoints: None,
            compliance: None,
        }
    }

    pub fn with_stages(mut self, stages: Vec<StageDescriptor>) -> Self {
        self.stages = stages;
        self
    }

    /// Save the context after every completed stage.
    pub fn with_checkpoints(mut self, store: CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Resolve the mandatory compliance rules into the context at the start
    /// of each run.
    pub fn with_compliance(mut self, store: ReferenceStore) -> Self {
        self.compliance = Some(store);
        self
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn checkpoints(&self) -> Option<&CheckpointStore> {
        self.checkpoints.as_ref()
    }

    pub fn stage_index(&self, selector: &str) -> Result<usize, PipelineError> {
        resolve_stage(&self.stages, selector)
    }

    /// Run every stage for a fresh context.
    pub async fn run(&self, brief: ContentBrief) -> Result<PipelineContext, PipelineError> {
        let mut ctx = PipelineContext::new(brief);
        self.resolve_compliance(&mut ctx);
        info!(run_id = %ctx.run_id, stages = self.stages.len(), "Pipeline run started");
        self.execute_from(0, ctx).await
    }

    /// Re-run from the selected stage, reusing the saved outputs of every
    /// earlier stage. Outputs at and after the selected stage are discarded.
    pub async fn replay_from(
        &self,
        selector: &str,
        mut saved: PipelineContext,
    ) -> Result<PipelineContext, PipelineError> {
        let start = self.stage_index(selector)?;
        let earlier: Vec<&str> = self.stages[..start].iter().map(|s| s.name).collect();

        if let Some(missing) = earlier.iter().find(|name| saved.output(name).is_none()) {
            return Err(PipelineError::IncompleteCheckpoint {
                resume_at: self.stages[start].name.to_string(),
                missing: missing.to_string(),
            });
        }

        saved.retain_stages(&earlier);
        if saved.compliance_rules.is_none() {
            self.resolve_compliance(&mut saved);
        }

        info!(
            run_id = %saved.run_id,
            resume_at = self.stages[start].name,
            reused = start,
            "Pipeline replay started"
        );
        self.execute_from(start, saved).await
    }

    fn resolve_compliance(&self, ctx: &mut PipelineContext) {
        if let Some(store) = &self.compliance {
            ctx.compliance_rules = Some(store.resolve_compliance_rules());
        }
    }

    async fn execute_from(
        &self,
        start: usize,
        mut ctx: PipelineContext,
    ) -> Result<PipelineContext, PipelineError> {
        let total = self.stages.len();

        for (index, stage) in self.stages.iter().enumerate().skip(start) {
            info!(stage = stage.name, index, total, "stage started");

            let output = match self.run_stage(stage, &ctx).await {
                Ok(output) => output,
                Err(e) => {
                    error!(stage = stage.name, index, error = %e, "stage failed");
                    return Err(PipelineError::StageFailed {
                        stage: stage.name.to_string(),
                        reason: e.to_string(),
                    });
                }
            };

            let tools_used = output.tool_usages.len();
            ctx.push(output);
            if let Some(store) = &self.checkpoints {
                store.save(&ctx)?;
            }

            info!(stage = stage.name, index, total, tools_used, "stage completed");
        }

        Ok(ctx)
    }

    async fn run_stage(
        &self,
        stage: &StageDescriptor,
        ctx: &PipelineContext,
    ) -> Result<StageOutput, PipelineError> {
        let tool_usages = self.gather_evidence(stage, ctx).await?;
        let prompt = build_prompt(stage, ctx, &tool_usages);
        let text = self.author.author(stage, &prompt).await?;

        Ok(StageOutput {
            stage: stage.name.to_string(),
            agent: stage.agent.to_string(),
            text,
            tool_usages,
            completed_at: Utc::now(),
        })
    }

    async fn gather_evidence(
        &self,
        stage: &StageDescriptor,
        ctx: &PipelineContext,
    ) -> Result<Vec<ToolUsage>, PipelineError> {
        let mut calls = Vec::new();
        for capability in stage.capabilities {
            match capability {
                Capability::ReferenceSearch => {
                    let mut query = ctx.brief.search_query();
                    if query.is_empty() {
                        query = ctx.brief.content_request.clone();
                    }
                    for category in Category::ALL {
                        calls.push(ToolCall::new(
                            capability.tool_name(),
                            serde_json::json!({ "category": category.as_str(), "query": query }),
                        ));
                    }
                }
                Capability::WebSearch => {
                    calls.push(ToolCall::new(
                        capability.tool_name(),
                        serde_json::json!({ "query": ctx.brief.content_request }),
                    ));
                }
            }
        }

        let mut usages = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.tools.execute(&call).await?;
            if !result.success {
                warn!(stage = stage.name, tool = %call.name, "Tool returned degraded result");
            }
            usages.push(ToolUsage {
                tool: call.name,
                arguments: call.arguments,
                success: result.success,
                output: result.output,
            });
        }
        Ok(usages)
    }
}

fn build_prompt(stage: &StageDescriptor, ctx: &PipelineContext, evidence: &[ToolUsage]) -> StagePrompt {
    let system = format!("{}\n\nYour goal: {}", stage.agent.persona(), stage.goal);

    let mut user = format!("## Content brief\n{}\n", ctx.brief.render());

    if let Some(rules) = &ctx.compliance_rules {
        user.push_str("\n## Compliance rules\n");
        for (rule, value) in rules.iter() {
            user.push_str(&format!("- {rule}: {value}\n"));
        }
    }

    if !ctx.outputs.is_empty() {
        user.push_str("\n## Previous stage outputs\n");
        for output in &ctx.outputs {
            user.push_str(&format!("\n### {} ({})\n{}\n", output.stage, output.agent, output.text));
        }
    }

    if !evidence.is_empty() {
        user.push_str("\n## Evidence\n");
        for usage in evidence {
            let label = usage.arguments["category"]
                .as_str()
                .map(|c| format!("{} ({c})", usage.tool))
                .unwrap_or_else(|| usage.tool.clone());
            user.push_str(&format!("\n### {label}\n{}\n", usage.output));
        }
    }

    user.push_str(&format!("\n## Task: {}\n{}\n", stage.name, stage.expected_output));

    StagePrompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use copyforge_config::BrandProfile;
    use copyforge_core::error::{ProviderError, ToolError};
    use copyforge_core::tool::{Tool, ToolResult};
    use std::sync::Mutex;

    /// Writes "<stage> output" and records every prompt it was given.
    struct RecordingAuthor {
        prompts: Mutex<Vec<(String, StagePrompt)>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingAuthor {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(vec![]),
                fail_on: None,
            }
        }

        fn failing_on(stage: &'static str) -> Self {
            Self {
                fail_on: Some(stage),
                ..Self::new()
            }
        }

        fn stages_seen(&self) -> Vec<String> {
            self.prompts.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
        }
    }

    #[async_trait]
    impl StageAuthor for RecordingAuthor {
        async fn author(&self, stage: &StageDescriptor, prompt: &StagePrompt) -> Result<String, ProviderError> {
            self.prompts
                .lock()
                .unwrap()
                .push((stage.name.to_string(), prompt.clone()));
            if self.fail_on == Some(stage.name) {
                return Err(ProviderError::Network("connection reset".into()));
            }
            Ok(format!("{} output", stage.name))
        }
    }

    struct StubTool {
        name: &'static str,
        success: bool,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            let text = format!("{} evidence for {}", self.name, arguments["query"]);
            Ok(if self.success {
                ToolResult::ok(text)
            } else {
                ToolResult::failed(format!("ERROR: {text}"))
            })
        }
    }

    fn registry(web_ok: bool) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StubTool {
            name: "reference_search",
            success: true,
        }));
        registry.register(Box::new(StubTool {
            name: "web_search",
            success: web_ok,
        }));
        Arc::new(registry)
    }

    fn brief() -> ContentBrief {
        ContentBrief::new("Blog about retirement planning", BrandProfile::default())
    }

    #[tokio::test]
    async fn run_appends_one_output_per_stage_in_order() {
        let author = Arc::new(RecordingAuthor::new());
        let pipeline = StagePipeline::new(registry(true), author.clone());

        let ctx = pipeline.run(brief()).await.unwrap();
        let stages: Vec<_> = ctx.outputs.iter().map(|o| o.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                "initialization",
                "brief_dispatch",
                "web_research",
                "content_creation",
                "revision",
                "finalization"
            ]
        );
        assert_eq!(ctx.last_output().unwrap().text, "finalization output");
        assert_eq!(author.stages_seen().len(), 6);
    }

    #[tokio::test]
    async fn stages_see_prior_outputs_and_their_evidence() {
        let author = Arc::new(RecordingAuthor::new());
        let pipeline = StagePipeline::new(registry(true), author.clone());
        let ctx = pipeline.run(brief()).await.unwrap();

        let prompts = author.prompts.lock().unwrap();
        let (_, revision) = &prompts[4];
        assert!(revision.user.contains("### content_creation (copywriter)\ncontent_creation output"));
        assert!(revision.user.contains("### reference_search (compliance_info)"));
        assert!(revision.system.contains("senior editor"));

        // Reference-backed stages query all three categories.
        assert_eq!(ctx.output("initialization").unwrap().tool_usages.len(), 3);
        assert!(ctx.output("brief_dispatch").unwrap().tool_usages.is_empty());
        let research = &ctx.output("web_research").unwrap().tool_usages;
        assert_eq!(research[0].tool, "web_search");
        assert_eq!(research[0].arguments["query"], "Blog about retirement planning");
    }

    #[tokio::test]
    async fn degraded_web_search_does_not_abort() {
        let pipeline = StagePipeline::new(registry(false), Arc::new(RecordingAuthor::new()));
        let ctx = pipeline.run(brief()).await.unwrap();
        let usage = &ctx.output("web_research").unwrap().tool_usages[0];
        assert!(!usage.success);
        assert!(usage.output.starts_with("ERROR:"));
        assert_eq!(ctx.outputs.len(), 6);
    }

    #[tokio::test]
    async fn failing_stage_aborts_run() {
        let author = Arc::new(RecordingAuthor::failing_on("content_creation"));
        let tmp = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointStore::new(tmp.path());
        let pipeline = StagePipeline::new(registry(true), author.clone())
            .with_checkpoints(checkpoints.clone());

        let err = pipeline.run(brief()).await.unwrap_err();
        match err {
            PipelineError::StageFailed { stage, reason } => {
                assert_eq!(stage, "content_creation");
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(author.stages_seen().last().unwrap(), "content_creation");
        assert_eq!(author.stages_seen().len(), 4);

        let saved = checkpoints.load_latest().unwrap();
        assert_eq!(saved.outputs.len(), 3);
    }

    #[tokio::test]
    async fn missing_tool_fails_stage() {
        let pipeline = StagePipeline::new(Arc::new(ToolRegistry::new()), Arc::new(RecordingAuthor::new()));
        let err = pipeline.run(brief()).await.unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed { ref stage, .. } if stage == "initialization"));
    }

    #[tokio::test]
    async fn replay_reuses_earlier_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointStore::new(tmp.path());
        let first = StagePipeline::new(registry(true), Arc::new(RecordingAuthor::new()))
            .with_checkpoints(checkpoints.clone());
        let original = first.run(brief()).await.unwrap();

        let author = Arc::new(RecordingAuthor::new());
        let replay = StagePipeline::new(registry(true), author.clone());
        let saved = checkpoints.load_latest().unwrap();
        let replayed = replay.replay_from("revision", saved).await.unwrap();

        assert_eq!(author.stages_seen(), vec!["revision", "finalization"]);
        assert_eq!(replayed.run_id, original.run_id);
        assert_eq!(replayed.outputs.len(), 6);
        assert_eq!(replayed.outputs[..4], original.outputs[..4]);
    }

    #[tokio::test]
    async fn replay_by_index_and_unknown_selector() {
        let pipeline = StagePipeline::new(registry(true), Arc::new(RecordingAuthor::new()));
        let ctx = pipeline.run(brief()).await.unwrap();

        let replayed = pipeline.replay_from("5", ctx.clone()).await.unwrap();
        assert_eq!(replayed.outputs.len(), 6);

        let err = pipeline.replay_from("publish", ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStage(_)));
    }

    #[tokio::test]
    async fn replay_requires_earlier_outputs() {
        let pipeline = StagePipeline::new(registry(true), Arc::new(RecordingAuthor::new()));
        let empty = PipelineContext::new(brief());
        let err = pipeline.replay_from("web_research", empty).await.unwrap_err();
        match err {
            PipelineError::IncompleteCheckpoint { resume_at, missing } => {
                assert_eq!(resume_at, "web_research");
                assert_eq!(missing, "initialization");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn compliance_rules_reach_the_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReferenceStore::new(copyforge_config::ReferenceConfig::rooted_at(tmp.path()));
        let author = Arc::new(RecordingAuthor::new());
        let pipeline = StagePipeline::new(registry(true), author.clone()).with_compliance(store);

        let ctx = pipeline.run(brief()).await.unwrap();
        let rules = ctx.compliance_rules.unwrap();
        assert!(rules.get("disclaimer").is_some());
        assert!(rules.get("data_protection").is_some());

        let prompts = author.prompts.lock().unwrap();
        assert!(prompts[0].1.user.contains("## Compliance rules\n- disclaimer:"));
    }
}
