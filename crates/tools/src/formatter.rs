//! Deterministic content formatter.
//!
//! Imposes a section structure on unstructured drafts and guarantees the
//! compliance disclaimer appears exactly once.

use async_trait::async_trait;
use copyforge_config::FormatterConfig;
use copyforge_core::error::{FormattingError, ToolError};
use copyforge_core::tool::{Tool, ToolResult};
use serde::Serialize;
use tracing::{debug, info};

/// Financial-services disclaimer appended to formatted content.
pub const DEFAULT_DISCLAIMER: &str = "This content is for informational purposes only and does not constitute financial advice. Investment advisory services involve risk. Past performance is not indicative of future results. Please consult with a qualified financial advisor before making any investment decisions.";

/// Inputs to a single format call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub content: String,
    pub content_type: String,
    pub tone: Option<String>,
    pub audience: Option<String>,
    /// Colon-separated section identifiers, e.g. `intro:body:outro`
    pub structure: Option<String>,
    pub include_disclaimers: bool,
}

impl FormatRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "blog".into(),
            tone: None,
            audience: None,
            structure: None,
            include_disclaimers: true,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = Some(structure.into());
        self
    }

    pub fn include_disclaimers(mut self, include: bool) -> Self {
        self.include_disclaimers = include;
        self
    }
}

/// Post-processing applied to each section body. Implementations must be
/// idempotent.
pub trait SectionHook: Send + Sync {
    fn apply(&self, body: &str, parameter: &str) -> String;
}

/// Leaves the body unchanged.
pub struct IdentityHook;

impl SectionHook for IdentityHook {
    fn apply(&self, body: &str, _parameter: &str) -> String {
        body.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Sections(Vec<Section>),
    /// Input that already had headings
    Verbatim(String),
}

/// Formatter output: either partitioned sections or verbatim text, plus at
/// most one disclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDocument {
    body: Body,
    disclaimer: Option<String>,
}

impl FormattedDocument {
    /// The partitioned sections. Empty when the input was passed through.
    pub fn sections(&self) -> &[Section] {
        match &self.body {
            Body::Sections(sections) => sections,
            Body::Verbatim(_) => &[],
        }
    }

    pub fn is_partitioned(&self) -> bool {
        matches!(self.body, Body::Sections(_))
    }

    /// The disclaimer text appended by this format call, if any.
    pub fn disclaimer(&self) -> Option<&str> {
        self.disclaimer.as_deref()
    }

    pub fn render(&self) -> String {
        let mut out = match &self.body {
            Body::Sections(sections) => sections
                .iter()
                .map(|s| format!("## {}\n\n{}", s.title, s.body))
                .collect::<Vec<_>>()
                .join("\n\n"),
            Body::Verbatim(text) => text.clone(),
        };
        if let Some(text) = &self.disclaimer {
            out.push_str(&disclaimer_block(text));
        }
        out
    }
}

/// Opening of a rendered disclaimer block, whatever its text.
const DISCLAIMER_MARKER: &str = "\n\n---\n\n*Disclaimer:";

fn disclaimer_block(text: &str) -> String {
    format!("\n\n---\n\n*Disclaimer: {text}*")
}

/// Remove every disclaimer block. A block runs from the marker to the first
/// `*` that ends a line; an unterminated marker is left alone.
fn strip_disclaimer_blocks(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find(DISCLAIMER_MARKER) {
        let after = &rest[start + DISCLAIMER_MARKER.len()..];
        let Some(end) = block_end(after) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after[end..];
    }
    out.push_str(rest);
    out
}

fn block_end(text: &str) -> Option<usize> {
    text.match_indices('*')
        .map(|(i, _)| i + 1)
        .find(|&end| text[end..].is_empty() || text[end..].starts_with('\n'))
}

/// Structures drafts and appends the disclaimer.
pub struct ContentFormatter {
    disclaimer: String,
    tone_hook: Box<dyn SectionHook>,
    audience_hook: Box<dyn SectionHook>,
}

impl ContentFormatter {
    pub fn new() -> Self {
        Self {
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            tone_hook: Box::new(IdentityHook),
            audience_hook: Box::new(IdentityHook),
        }
    }

    pub fn from_config(config: &FormatterConfig) -> Self {
        match &config.disclaimer {
            Some(text) => Self::new().with_disclaimer(text),
            None => Self::new(),
        }
    }

    /// Use a custom disclaimer. Blank text keeps the default.
    pub fn with_disclaimer(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.disclaimer = text.trim().to_string();
        }
        self
    }

    pub fn with_tone_hook(mut self, hook: Box<dyn SectionHook>) -> Self {
        self.tone_hook = hook;
        self
    }

    pub fn with_audience_hook(mut self, hook: Box<dyn SectionHook>) -> Self {
        self.audience_hook = hook;
        self
    }

    pub fn disclaimer_text(&self) -> &str {
        &self.disclaimer
    }

    /// Section identifiers for a request: the explicit structure if given,
    /// otherwise the content type's default.
    pub fn resolve_structure(
        content_type: &str,
        structure: Option<&str>,
    ) -> Result<Vec<String>, FormattingError> {
        let template = match structure {
            Some(s) => s.trim(),
            None => match content_type.to_lowercase().as_str() {
                "blog" => "introduction:problem:solution:conclusion",
                "whitepaper" => "exec_summary:problem:methodology:results:conclusions",
                _ => "introduction:body:conclusion",
            },
        };

        if template.is_empty() {
            return Err(FormattingError::EmptyTemplate);
        }

        template
            .split(':')
            .map(|id| {
                let id = id.trim();
                if id.is_empty() {
                    Err(FormattingError::InvalidStructure {
                        template: template.to_string(),
                        reason: "empty section identifier".into(),
                    })
                } else {
                    Ok(id.to_string())
                }
            })
            .collect()
    }

    pub fn format(&self, request: &FormatRequest) -> Result<FormattedDocument, FormattingError> {
        let section_ids =
            Self::resolve_structure(&request.content_type, request.structure.as_deref())?;

        let content = if request.include_disclaimers {
            strip_disclaimer_blocks(&request.content)
        } else {
            request.content.clone()
        };

        let body = if has_headings(&content) {
            debug!("Content already has headings, skipping partition");
            Body::Verbatim(self.apply_hooks(&content, request))
        } else {
            let parts = split_paragraphs(&content, section_ids.len());
            let sections = section_ids
                .iter()
                .zip(parts)
                .map(|(id, body)| Section {
                    title: section_title(id),
                    body: self.apply_hooks(&body, request),
                })
                .collect();
            Body::Sections(sections)
        };

        let disclaimer = (request.include_disclaimers && !body_mentions(&body, &self.disclaimer))
            .then(|| self.disclaimer.clone());

        let document = FormattedDocument { body, disclaimer };
        info!(
            content_type = %request.content_type,
            sections = document.sections().len(),
            disclaimer = document.disclaimer.is_some(),
            "Content formatted"
        );
        Ok(document)
    }

    fn apply_hooks(&self, body: &str, request: &FormatRequest) -> String {
        let mut body = body.to_string();
        if let Some(tone) = &request.tone {
            body = self.tone_hook.apply(&body, tone);
        }
        if let Some(audience) = &request.audience {
            body = self.audience_hook.apply(&body, audience);
        }
        body
    }
}

impl Default for ContentFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn body_mentions(body: &Body, text: &str) -> bool {
    match body {
        Body::Sections(sections) => sections.iter().any(|s| s.body.contains(text)),
        Body::Verbatim(content) => content.contains(text),
    }
}

/// Whether the text contains a markdown heading marker (`#` then whitespace).
fn has_headings(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' && chars.peek().is_some_and(|next| next.is_whitespace()) {
            return true;
        }
    }
    false
}

/// Distribute paragraphs over `sections` slots: the first `P % S` slots get
/// one extra paragraph. Missing slots are empty.
fn split_paragraphs(content: &str, sections: usize) -> Vec<String> {
    let paragraphs: Vec<&str> = content.split("\n\n").collect();
    let per_section = paragraphs.len() / sections;
    let remainder = paragraphs.len() % sections;

    let mut parts = Vec::with_capacity(sections);
    let mut start = 0;
    for i in 0..sections {
        let take = per_section + usize::from(i < remainder);
        let end = (start + take).min(paragraphs.len());
        parts.push(paragraphs[start..end].join("\n\n"));
        start = end;
    }
    parts
}

/// `exec_summary` → `Exec Summary`.
fn section_title(id: &str) -> String {
    let mut title = String::with_capacity(id.len());
    let mut prev_alpha = false;
    for c in id.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            title.push(c);
            prev_alpha = false;
        }
    }
    title
}

/// Exposes the formatter to stages.
pub struct ContentFormatterTool {
    formatter: ContentFormatter,
    default_content_type: String,
}

impl ContentFormatterTool {
    pub fn new(formatter: ContentFormatter, default_content_type: impl Into<String>) -> Self {
        Self {
            formatter,
            default_content_type: default_content_type.into(),
        }
    }

    pub fn from_config(config: &FormatterConfig) -> Self {
        Self::new(
            ContentFormatter::from_config(config),
            config.default_content_type.clone(),
        )
    }
}

#[async_trait]
impl Tool for ContentFormatterTool {
    fn name(&self) -> &str {
        "content_formatter"
    }

    fn description(&self) -> &str {
        "Format content into titled sections and append the compliance disclaimer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "The content to format" },
                "content_type": { "type": "string", "description": "blog, whitepaper, article, ..." },
                "tone": { "type": "string" },
                "target_audience": { "type": "string" },
                "structure": { "type": "string", "description": "Colon-separated sections, e.g. intro:problem:solution" },
                "include_disclaimers": { "type": "boolean", "default": true }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let mut request = FormatRequest::new(content).content_type(
            arguments["content_type"]
                .as_str()
                .unwrap_or(&self.default_content_type),
        );
        if let Some(tone) = arguments["tone"].as_str() {
            request = request.tone(tone);
        }
        if let Some(audience) = arguments["target_audience"].as_str() {
            request = request.audience(audience);
        }
        if let Some(structure) = arguments["structure"].as_str() {
            request = request.structure(structure);
        }
        if let Some(include) = arguments["include_disclaimers"].as_bool() {
            request = request.include_disclaimers(include);
        }

        let document = self
            .formatter
            .format(&request)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::ok(document.render()).with_data(serde_json::json!({
            "sections": document.sections(),
            "disclaimer": document.disclaimer().is_some(),
        })))
    }
}
