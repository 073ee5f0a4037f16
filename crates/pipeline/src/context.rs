//! The run-scoped context that accumulates across stages.

use chrono::{DateTime, Utc};
use copyforge_config::BrandProfile;
use copyforge_reference::ComplianceRuleResolution;
use serde::{Deserialize, Serialize};

/// What to write, and for which brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBrief {
    pub content_request: String,
    /// Formatter content type (`blog`, `whitepaper`, ...)
    pub content_type: String,
    /// Explicit formatter template; the content type's default otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_structure: Option<String>,
    pub brand: BrandProfile,
}

impl ContentBrief {
    pub fn new(content_request: impl Into<String>, brand: BrandProfile) -> Self {
        Self {
            content_request: content_request.into(),
            content_type: "blog".into(),
            format_structure: None,
            brand,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_format_structure(mut self, structure: impl Into<String>) -> Self {
        self.format_structure = Some(structure.into());
        self
    }

    /// The brief used by training runs.
    pub fn training(brand: BrandProfile) -> Self {
        Self::new(
            "Create a blog post about the benefits of Siebert Financial's investment advisory services",
            brand,
        )
    }

    /// The brief used by evaluation runs.
    pub fn evaluation() -> Self {
        let brand = BrandProfile {
            brand_name: "Siebert Financial".into(),
            tone_of_voice: "Professional, informative, and educational".into(),
            primary_target: "Individual investors interested in diversifying their portfolios".into(),
            secondary_target: "Financial advisors looking to recommend mutual fund options to clients"
                .into(),
            unique_selling_points:
                "Wide range of fund options, low expense ratios, experienced fund managers".into(),
            brand_colors: "Blue and white".into(),
            keywords: "mutual funds, portfolio diversification, fund management, investment strategy, \
                       retirement planning, asset allocation"
                .into(),
            avoid_terms: "guaranteed returns, risk-free investments, market timing, hot stock tips"
                .into(),
            structure: "Introduction, Types of Mutual Funds, Benefits of Investing, How to Choose the \
                        Right Fund, Getting Started with Siebert, Conclusion"
                .into(),
            ideal_length: "1000-1500 words".into(),
            required_elements: "Fund performance metrics, expense ratio explanations, investment \
                                minimums, Siebert's fund selection process"
                .into(),
            mandatory_elements: "Risk disclosures, fee transparency, diversification importance"
                .into(),
            forbidden_elements: "Specific return promises, competitor criticism, tax advice".into(),
            disclaimers: "Mutual fund investments are subject to market risks. Past performance is \
                          not indicative of future results. Please read the prospectus carefully \
                          before investing."
                .into(),
        };
        Self::new(
            "Create a comprehensive guide about mutual funds offered by Siebert Financial, \
             explaining their benefits, types, and how to get started",
            brand,
        )
    }

    /// Query terms for reference search: distinct words longer than three
    /// characters from the keywords and the request, lowercased.
    pub fn search_query(&self) -> String {
        let mut terms: Vec<String> = Vec::new();
        let text = format!("{} {}", self.brand.keywords, self.content_request);
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.chars().count() > 3 && !terms.contains(&word) {
                terms.push(word);
            }
        }
        terms.join(" ")
    }

    /// The brief as a prompt block.
    pub fn render(&self) -> String {
        let b = &self.brand;
        let fields = [
            ("Content request", self.content_request.as_str()),
            ("Content type", self.content_type.as_str()),
            ("Brand name", b.brand_name.as_str()),
            ("Tone of voice", b.tone_of_voice.as_str()),
            ("Primary target", b.primary_target.as_str()),
            ("Secondary target", b.secondary_target.as_str()),
            ("Unique selling points", b.unique_selling_points.as_str()),
            ("Brand colors", b.brand_colors.as_str()),
            ("Keywords", b.keywords.as_str()),
            ("Avoid terms", b.avoid_terms.as_str()),
            ("Structure", b.structure.as_str()),
            ("Ideal length", b.ideal_length.as_str()),
            ("Required elements", b.required_elements.as_str()),
            ("Mandatory elements", b.mandatory_elements.as_str()),
            ("Forbidden elements", b.forbidden_elements.as_str()),
            ("Disclaimers", b.disclaimers.as_str()),
        ];
        fields
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(label, value)| format!("- {label}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One tool call made while gathering a stage's evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool: String,
    pub arguments: serde_json::Value,
    pub success: bool,
    pub output: String,
}

/// The artifact a stage appended to the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: String,
    pub agent: String,
    pub text: String,
    #[serde(default)]
    pub tool_usages: Vec<ToolUsage>,
    pub completed_at: DateTime<Utc>,
}

/// State carried from stage to stage for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub brief: ContentBrief,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_rules: Option<ComplianceRuleResolution>,
    /// Stage outputs in execution order
    #[serde(default)]
    pub outputs: Vec<StageOutput>,
}

impl PipelineContext {
    pub fn new(brief: ContentBrief) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            brief,
            compliance_rules: None,
            outputs: Vec::new(),
        }
    }

    pub fn output(&self, stage: &str) -> Option<&StageOutput> {
        self.outputs.iter().find(|o| o.stage == stage)
    }

    pub fn last_output(&self) -> Option<&StageOutput> {
        self.outputs.last()
    }

    pub(crate) fn push(&mut self, output: StageOutput) {
        self.outputs.push(output);
    }

    /// Keep only the outputs of the given stages, in their recorded order.
    pub(crate) fn retain_stages(&mut self, stages: &[&str]) {
        self.outputs.retain(|o| stages.contains(&o.stage.as_str()));
    }
}
