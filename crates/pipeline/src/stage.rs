//! The ordered stage registry.
//!
//! Each stage is described once, up front: which agent authors it, what it
//! must produce, and which tools it consults. The pipeline never discovers
//! stages at runtime.

use copyforge_core::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The persona that authors a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Leader,
    WebSearcher,
    Copywriter,
    Editor,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Leader => "leader",
            AgentRole::WebSearcher => "web_searcher",
            AgentRole::Copywriter => "copywriter",
            AgentRole::Editor => "editor",
        }
    }

    /// System instructions for this persona.
    pub fn persona(&self) -> &'static str {
        match self {
            AgentRole::Leader => {
                "You are the content team lead. You turn a content request into a precise brief, \
                 keep every stage aligned with the brand profile, and sign off the final piece."
            }
            AgentRole::WebSearcher => {
                "You are a financial research specialist. You find current, credible sources and \
                 summarise the facts a copywriter needs, always citing where each fact came from."
            }
            AgentRole::Copywriter => {
                "You are an expert financial copywriter. You write engaging, accurate copy in the \
                 brand's tone of voice, using brand facts only as reference and never promising returns."
            }
            AgentRole::Editor => {
                "You are a compliance-minded senior editor. You tighten prose, enforce the brand \
                 voice, remove forbidden terms, and make sure every mandatory disclosure is present."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool capability a stage requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ReferenceSearch,
    WebSearch,
}

impl Capability {
    /// Name of the registered tool providing this capability.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Capability::ReferenceSearch => "reference_search",
            Capability::WebSearch => "web_search",
        }
    }
}

/// One step of the content pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub name: &'static str,
    pub agent: AgentRole,
    pub goal: &'static str,
    pub expected_output: &'static str,
    pub capabilities: &'static [Capability],
}

/// The fixed six-stage sequence.
pub fn default_stages() -> Vec<StageDescriptor> {
    vec![
        StageDescriptor {
            name: "initialization",
            agent: AgentRole::Leader,
            goal: "Review the content request against the brand, best-practice and compliance \
                   reference data and identify what the piece must achieve.",
            expected_output: "A short analysis of the request: objective, audience, key brand facts \
                              and the compliance constraints that apply.",
            capabilities: &[Capability::ReferenceSearch],
        },
        StageDescriptor {
            name: "brief_dispatch",
            agent: AgentRole::Leader,
            goal: "Turn the analysis into a creative brief for the research and writing stages.",
            expected_output: "A structured brief: angle, outline following the requested structure, \
                              keywords to use, terms to avoid, required and mandatory elements.",
            capabilities: &[],
        },
        StageDescriptor {
            name: "web_research",
            agent: AgentRole::WebSearcher,
            goal: "Research current, credible information supporting the brief.",
            expected_output: "A research summary of the most relevant findings, each with its source link.",
            capabilities: &[Capability::WebSearch],
        },
        StageDescriptor {
            name: "content_creation",
            agent: AgentRole::Copywriter,
            goal: "Write the full draft following the brief, the research and the brand guidelines.",
            expected_output: "A complete draft of the requested length in the brand's tone of voice.",
            capabilities: &[Capability::ReferenceSearch],
        },
        StageDescriptor {
            name: "revision",
            agent: AgentRole::Editor,
            goal: "Revise the draft for accuracy, tone, and regulatory compliance.",
            expected_output: "The revised draft with forbidden terms removed and mandatory \
                              disclosures in place.",
            capabilities: &[Capability::ReferenceSearch],
        },
        StageDescriptor {
            name: "finalization",
            agent: AgentRole::Leader,
            goal: "Approve the revised draft and produce the publication-ready text.",
            expected_output: "Only the final content, ready to publish, with no commentary.",
            capabilities: &[],
        },
    ]
}

/// Resolve a stage selector (name or 0-based index) to an index.
pub fn resolve_stage(stages: &[StageDescriptor], selector: &str) -> Result<usize, PipelineError> {
    let selector = selector.trim();
    if let Some(index) = stages.iter().position(|s| s.name == selector) {
        return Ok(index);
    }
    match selector.parse::<usize>() {
        Ok(index) if index < stages.len() => Ok(index),
        _ => Err(PipelineError::UnknownStage(selector.to_string())),
    }
}
