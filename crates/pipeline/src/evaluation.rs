//! Evaluation runs: repeated crew runs scored 1–10 by an evaluation model.

use crate::context::ContentBrief;
use crate::crew::ContentCrew;
use copyforge_config::{AppConfig, ProviderKind, Service};
use copyforge_core::error::{Error, ProviderError, Result};
use copyforge_core::message::Message;
use copyforge_core::provider::{Provider, ProviderRequest};
use copyforge_providers::{AnthropicProvider, OpenAiProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const EVALUATOR_PERSONA: &str = "You are a strict reviewer of financial marketing content. \
    Judge how well the content fulfils the brief: accuracy, brand voice, structure, \
    and compliance. Reply with a line of the form 'Score: N' where N is an integer from 1 to 10, \
    followed by a one-paragraph justification.";

/// Scores finished content with a language model.
pub struct Evaluator {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Evaluator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Pick the provider from the model name: `claude*` goes to Anthropic,
    /// everything else to OpenAI.
    pub fn from_config(config: &AppConfig, model: &str) -> Self {
        let key = |service: Service| config.api_key_for(service).ok().map(str::to_string);
        let provider: Arc<dyn Provider> = match provider_for_model(model) {
            ProviderKind::Anthropic => {
                let mut p = AnthropicProvider::new(key(Service::Anthropic));
                if let Some(url) = &config.models.anthropic_base_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ProviderKind::OpenAi => {
                let mut p = OpenAiProvider::new(key(Service::OpenAi));
                if let Some(url) = &config.models.openai_base_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
        };
        Self::new(provider, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn score(&self, brief: &ContentBrief, content: &str) -> std::result::Result<f64, ProviderError> {
        let prompt = format!(
            "## Brief\n{}\n\n## Content to evaluate\n{}\n",
            brief.render(),
            content
        );
        let request = ProviderRequest::new(
            self.model.clone(),
            vec![Message::system(EVALUATOR_PERSONA), Message::user(prompt)],
        )
        .with_temperature(0.0);

        let response = self.provider.complete(request).await?;
        parse_score(&response.message.content).ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "No 1-10 score in evaluation reply: {}",
                response.message.content.chars().take(120).collect::<String>()
            ))
        })
    }
}

pub fn provider_for_model(model: &str) -> ProviderKind {
    if model.trim().to_lowercase().starts_with("claude") {
        ProviderKind::Anthropic
    } else {
        ProviderKind::OpenAi
    }
}

/// Extract a 1–10 score. A line mentioning "score" is preferred; otherwise
/// the first in-range number anywhere in the reply.
pub fn parse_score(reply: &str) -> Option<f64> {
    reply
        .lines()
        .filter(|line| line.to_lowercase().contains("score"))
        .find_map(first_in_range)
        .or_else(|| first_in_range(reply))
}

fn first_in_range(text: &str) -> Option<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() || (c == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(c);
        } else if !current.is_empty() {
            numbers.push(current.trim_end_matches('.').to_string());
            current.clear();
        }
    }
    numbers
        .iter()
        .filter_map(|n| n.parse::<f64>().ok())
        .find(|n| (1.0..=10.0).contains(n))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationScore {
    pub iteration: u32,
    pub run_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub eval_model: String,
    pub scores: Vec<IterationScore>,
    pub mean: f64,
}

/// Run the crew `iterations` times and score each result.
pub async fn evaluate(
    crew: &ContentCrew,
    evaluator: &Evaluator,
    brief: &ContentBrief,
    iterations: u32,
) -> Result<EvaluationReport> {
    if iterations == 0 {
        return Err(Error::Config {
            message: "Evaluation needs at least one iteration".into(),
        });
    }

    let mut scores = Vec::with_capacity(iterations as usize);
    for iteration in 1..=iterations {
        let output = crew.kickoff(brief.clone()).await?;
        let score = evaluator.score(brief, &output.rendered).await?;
        info!(iteration, iterations, score, model = evaluator.model(), "Evaluation iteration scored");
        scores.push(IterationScore {
            iteration,
            run_id: output.context.run_id,
            score,
        });
    }

    let mean = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
    Ok(EvaluationReport {
        eval_model: evaluator.model().to_string(),
        scores,
        mean,
    })
}
