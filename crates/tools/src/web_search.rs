//! Web search through the Serper API.
//!
//! `SerperClient` is the search collaborator: one POST per attempt, wrapped
//! in the configured retry policy. `WebSearchTool` renders its response as
//! markdown for the research stage.

use async_trait::async_trait;
use copyforge_config::{AppConfig, SearchConfig};
use copyforge_core::error::{SearchError, ToolError};
use copyforge_core::retry::RetryPolicy;
use copyforge_core::search::{SearchCollaborator, SearchResponse};
use copyforge_core::tool::{Tool, ToolResult};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Serper search client.
pub struct SerperClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    language: String,
    user_agent: String,
    retry: RetryPolicy,
}

impl SerperClient {
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
            language: config.language.clone(),
            user_agent: config.user_agent.clone(),
            retry: config.retry_policy(),
        }
    }

    /// Build from the full configuration. A missing key is reported on the
    /// first search, not here.
    pub fn from_config(config: &AppConfig) -> Self {
        let api_key = config.api_key("serper").ok().map(str::to_string);
        Self::new(&config.search, api_key)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(
        &self,
        api_key: &str,
        body: &serde_json::Value,
        attempt: u32,
    ) -> Result<SearchResponse, SearchError> {
        debug!(attempt, max_attempts = self.retry.max_attempts, "search request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SearchError::Unauthorized {
                status_code: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SearchError::Status {
                status_code: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchCollaborator for SerperClient {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<SearchResponse, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("must be a non-empty string".into()));
        }
        if !(1..=100).contains(&num_results) {
            return Err(SearchError::InvalidQuery(format!(
                "num_results {num_results} must be between 1-100"
            )));
        }
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SearchError::MissingCredential {
                service: "serper".into(),
            })?;

        let body = serde_json::json!({
            "q": query,
            "num": num_results,
            "page": 1,
            "hl": self.language,
        });

        let response = self
            .retry
            .run(
                |attempt| self.send_once(api_key, &body, attempt),
                SearchError::is_retryable,
            )
            .await?;

        info!(
            query,
            results = response.organic.len().min(num_results),
            "Web search completed"
        );
        Ok(response)
    }
}

/// Render a search response as markdown, keeping at most `num_results`
/// organic entries.
pub fn render_results(query: &str, response: &SearchResponse, num_results: usize) -> String {
    let mut out = format!("## Web Search Results for '{query}'\n\n### Top Results:\n");

    if response.organic.is_empty() {
        out.push_str("No results found.\n");
    }

    for (i, result) in response.organic.iter().take(num_results).enumerate() {
        let title = non_empty(&result.title).unwrap_or("No title");
        let link = non_empty(&result.link).unwrap_or("No link");
        let snippet = non_empty(&result.snippet).unwrap_or("No snippet");

        let _ = writeln!(out, "**{}. {title}**", i + 1);
        let _ = writeln!(out, "- 🔗 [Source]({link})");
        if let Some(author) = result.author.as_deref().and_then(non_empty) {
            let _ = writeln!(out, "- 👤 {author}");
        }
        if let Some(date) = result.date.as_deref().and_then(non_empty) {
            let _ = writeln!(out, "- 📅 {date}");
        }
        let _ = writeln!(out, "- 📝 {snippet}\n");
    }

    if let Some(kg) = &response.knowledge_graph {
        out.push_str("\n### Knowledge Graph:\n");
        let _ = writeln!(out, "**{}**", kg.title.as_deref().unwrap_or("N/A"));
        let _ = writeln!(out, "- Type: {}", kg.kind.as_deref().unwrap_or("N/A"));
        let _ = writeln!(
            out,
            "- Description: {}",
            kg.description.as_deref().unwrap_or("N/A")
        );
        for (attr, value) in &kg.attributes {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let _ = writeln!(out, "- {}: {value}", capitalize(attr));
        }
    }

    out
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Web search tool backed by a search collaborator.
pub struct WebSearchTool {
    collaborator: Arc<dyn SearchCollaborator>,
    default_num_results: usize,
}

impl WebSearchTool {
    pub fn new(collaborator: Arc<dyn SearchCollaborator>, default_num_results: usize) -> Self {
        Self {
            collaborator,
            default_num_results,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns ranked results with titles, links, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (1-100)",
                    "default": self.default_num_results
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let num_results = arguments["num_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(self.default_num_results);

        match self.collaborator.search(query, num_results).await {
            Ok(response) => {
                let data = serde_json::to_value(&response).unwrap_or_default();
                Ok(ToolResult::ok(render_results(query, &response, num_results)).with_data(data))
            }
            Err(e @ SearchError::MissingCredential { .. }) => Err(ToolError::NotConfigured {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            }),
            Err(SearchError::InvalidQuery(reason)) => Err(ToolError::InvalidArguments(reason)),
            Err(e) => {
                error!(query, error = %e, "Web search failed");
                Ok(ToolResult::failed(format!("ERROR: {e}")))
            }
        }
    }
}
