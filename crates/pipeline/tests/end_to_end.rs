//! Full crew runs against temp reference files, a mock search collaborator
//! and scripted providers.

use async_trait::async_trait;
use copyforge_config::{AppConfig, ReferenceConfig};
use copyforge_core::error::{PipelineError, ProviderError, SearchError};
use copyforge_core::message::Message;
use copyforge_core::provider::{Provider, ProviderRequest, ProviderResponse};
use copyforge_core::search::{OrganicResult, SearchCollaborator, SearchResponse};
use copyforge_pipeline::{
    ContentBrief, ContentCrew, Evaluator, LlmAuthor, default_stages, evaluate, train,
};
use copyforge_providers::ProviderRouter;
use copyforge_tools::DEFAULT_DISCLAIMER;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Returns scripted responses in order and records every request.
struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            requests: Mutex::new(vec![]),
        })
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("script exhausted".into()))?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model,
        })
    }
}

struct MockSearch {
    queries: Mutex<Vec<String>>,
    fail: bool,
}

impl MockSearch {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            queries: Mutex::new(vec![]),
            fail,
        })
    }
}

#[async_trait]
impl SearchCollaborator for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, _num_results: usize) -> Result<SearchResponse, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(SearchError::Status {
                status_code: 503,
                body: "unavailable".into(),
            });
        }
        Ok(SearchResponse {
            organic: vec![OrganicResult {
                title: "Retirement accounts explained".into(),
                link: "https://example.com/ira".into(),
                snippet: "IRAs and 401(k)s compared.".into(),
                ..Default::default()
            }],
            knowledge_graph: None,
        })
    }
}

const FINAL_DRAFT: &str = "Saving early matters.\n\nMany investors start late.\n\nA plan fixes that.\n\nTalk to an advisor.";

fn stage_script(final_text: &'static str) -> Vec<&'static str> {
    vec![
        "analysis",
        "brief",
        "research notes",
        "first draft",
        "revised draft",
        final_text,
    ]
}

fn write_reference_files(base: &Path) {
    let brand = base.join("Rag 1/brand_info.csv");
    let compliance = base.join("Rag 3/compliance_info.csv");
    std::fs::create_dir_all(brand.parent().unwrap()).unwrap();
    std::fs::create_dir_all(compliance.parent().unwrap()).unwrap();
    std::fs::write(
        &brand,
        "Area,Key Info\nMinimum Investment,$500\nBrand Name,Siebert Financial\nTone of Voice,Professional\n",
    )
    .unwrap();
    std::fs::write(
        &compliance,
        "disclaimer,data_protection\n\"Investing involves risk, including loss of principal.\",GDPR compliant\n",
    )
    .unwrap();
}

fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.reference = ReferenceConfig::rooted_at(dir.join("RAG"));
    config.runtime.state_dir = dir.join("state");
    write_reference_files(&config.reference.base_dir);
    config
}

fn crew_with(config: &AppConfig, provider: Arc<ScriptedProvider>, search: Arc<MockSearch>) -> ContentCrew {
    let mut router = ProviderRouter::new("openai");
    router.register("anthropic", provider.clone(), "claude-test");
    router.register("openai", provider, "gpt-test");
    for (stage, kind) in &config.stage_providers {
        router.assign(stage.clone(), kind.as_str());
    }
    let author = Arc::new(LlmAuthor::new(router, &config.models));
    ContentCrew::with_parts(config, search, author)
}

fn brief() -> ContentBrief {
    ContentBrief::new(
        "Write a blog post about retirement planning with Siebert",
        AppConfig::default().brand,
    )
}

#[tokio::test]
async fn crew_run_produces_formatted_document() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let provider = ScriptedProvider::new(&stage_script(FINAL_DRAFT));
    let search = MockSearch::new(false);
    let crew = crew_with(&config, provider.clone(), search.clone());

    let output = crew.kickoff(brief()).await.unwrap();

    assert_eq!(provider.call_count(), 6);
    assert_eq!(output.context.outputs.len(), 6);

    let titles: Vec<_> = output
        .document
        .sections()
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Introduction", "Problem", "Solution", "Conclusion"]);
    assert_eq!(output.document.sections()[0].body, "Saving early matters.");
    assert_eq!(output.rendered.matches("*Disclaimer:").count(), 1);
    assert!(output.rendered.contains(DEFAULT_DISCLAIMER));

    // Reference evidence came from the temp brand table.
    let init = output.context.output("initialization").unwrap();
    assert!(init.tool_usages[0].output.contains("- Minimum Investment: $500"));

    // Compliance rules resolved from the compliance sheet.
    let rules = output.context.compliance_rules.as_ref().unwrap();
    assert_eq!(
        rules.get("disclaimer"),
        Some("Investing involves risk, including loss of principal.")
    );
    assert_eq!(rules.get("data_protection"), Some("GDPR compliant"));

    // The research stage searched the content request.
    assert_eq!(
        *search.queries.lock().unwrap(),
        vec!["Write a blog post about retirement planning with Siebert"]
    );
    let research = output.context.output("web_research").unwrap();
    assert!(research.tool_usages[0].output.contains("Retirement accounts explained"));

    // Stages were routed to their configured providers' models.
    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].model, "claude-test");
    assert_eq!(requests[2].model, "gpt-test");
}

#[tokio::test]
async fn missing_reference_files_are_backfilled() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.reference = ReferenceConfig::rooted_at(tmp.path().join("RAG"));
    config.runtime.state_dir = tmp.path().join("state");

    let crew = crew_with(
        &config,
        ScriptedProvider::new(&stage_script(FINAL_DRAFT)),
        MockSearch::new(false),
    );
    let output = crew.kickoff(brief()).await.unwrap();

    assert!(config.reference.base_dir.join("Rag 2/best_practices.csv").exists());
    let rules = output.context.compliance_rules.unwrap();
    assert!(rules.get("disclaimer").is_some());
}

#[tokio::test]
async fn search_failure_degrades_research_stage() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let crew = crew_with(
        &config,
        ScriptedProvider::new(&stage_script(FINAL_DRAFT)),
        MockSearch::new(true),
    );

    let output = crew.kickoff(brief()).await.unwrap();
    let usage = &output.context.output("web_research").unwrap().tool_usages[0];
    assert!(!usage.success);
    assert!(usage.output.starts_with("ERROR:"));
}

#[tokio::test]
async fn provider_failure_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let provider = ScriptedProvider::new(&["analysis", "brief"]);
    let crew = crew_with(&config, provider.clone(), MockSearch::new(false));

    let err = crew.kickoff(brief()).await.unwrap_err();
    assert!(matches!(err, PipelineError::StageFailed { ref stage, .. } if stage == "web_research"));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn replay_latest_reruns_tail_only() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let first = crew_with(
        &config,
        ScriptedProvider::new(&stage_script(FINAL_DRAFT)),
        MockSearch::new(false),
    );
    let original = first.kickoff(brief()).await.unwrap();

    let provider = ScriptedProvider::new(&["re-revised draft", "# Final\n\nShort and sweet."]);
    let second = crew_with(&config, provider.clone(), MockSearch::new(false));
    let replayed = second.replay_latest("revision").await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(replayed.context.run_id, original.context.run_id);
    assert_eq!(replayed.context.outputs[..4], original.context.outputs[..4]);
    assert_eq!(replayed.context.outputs[4].text, "re-revised draft");

    // Headed text is passed through but still gets one disclaimer.
    assert!(!replayed.document.is_partitioned());
    assert!(replayed.rendered.starts_with("# Final\n\nShort and sweet."));
    assert_eq!(replayed.rendered.matches("*Disclaimer:").count(), 1);
}

#[tokio::test]
async fn training_writes_every_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let mut script = stage_script(FINAL_DRAFT);
    script.extend(stage_script(FINAL_DRAFT));
    let crew = crew_with(&config, ScriptedProvider::new(&script), MockSearch::new(false));

    let path = tmp.path().join("out/training.json");
    let report = train(&crew, &ContentBrief::training(config.brand.clone()), 2, &path)
        .await
        .unwrap();
    assert_eq!(report.runs.len(), 2);

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["iterations"], 2);
    assert_eq!(
        saved["runs"][1]["stages"].as_array().unwrap().len(),
        default_stages().len()
    );
}

#[tokio::test]
async fn evaluation_scores_each_iteration() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let mut script = stage_script(FINAL_DRAFT);
    script.extend(stage_script(FINAL_DRAFT));
    let crew = crew_with(&config, ScriptedProvider::new(&script), MockSearch::new(false));

    let judge = ScriptedProvider::new(&["Score: 8\nStrong.", "Score: 6\nNeeds work."]);
    let evaluator = Evaluator::new(judge.clone(), "gpt-4");

    let report = evaluate(&crew, &evaluator, &ContentBrief::evaluation(), 2)
        .await
        .unwrap();
    let scores: Vec<f64> = report.scores.iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![8.0, 6.0]);
    assert_eq!(report.mean, 7.0);
    assert_eq!(report.eval_model, "gpt-4");

    let requests = judge.requests.lock().unwrap();
    assert!(requests[0].messages[1].content.contains("mutual funds"));
}
