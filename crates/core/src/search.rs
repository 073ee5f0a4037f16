//! Search collaborator: the abstraction over the outbound web-search API.
//!
//! The pipeline consumes only the fields modelled here. Everything except the
//! organic result's title, link and snippet is optional on the wire.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::SearchError;

/// A ranked search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Organic results in rank order
    #[serde(default)]
    pub organic: Vec<OrganicResult>,

    /// Knowledge-graph panel, when the engine returned one
    #[serde(
        default,
        rename = "knowledgeGraph",
        skip_serializing_if = "Option::is_none"
    )]
    pub knowledge_graph: Option<KnowledgeGraph>,
}

/// A single organic result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub snippet: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Knowledge-graph panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Attribute name → value, kept sorted for stable rendering
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Performs web queries and returns ranked results.
///
/// Implementations own their retry discipline; a returned error means the
/// retry budget is spent (or the error was not retryable).
#[async_trait]
pub trait SearchCollaborator: Send + Sync {
    /// A human-readable name (e.g., "serper").
    fn name(&self) -> &str;

    /// Run a query and return at most `num_results` organic results.
    async fn search(&self, query: &str, num_results: usize) -> Result<SearchResponse, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_payload() {
        let json = serde_json::json!({
            "organic": [
                {
                    "title": "Mutual Funds 101",
                    "link": "https://example.com/funds",
                    "snippet": "An introduction.",
                    "date": "Jan 2, 2025",
                    "position": 1
                }
            ],
            "knowledgeGraph": {
                "title": "Mutual fund",
                "type": "Investment vehicle",
                "description": "A pooled investment.",
                "attributes": { "regulator": "SEC" }
            }
        });
        let resp: SearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.organic.len(), 1);
        assert_eq!(resp.organic[0].date.as_deref(), Some("Jan 2, 2025"));
        assert!(resp.organic[0].author.is_none());
        let kg = resp.knowledge_graph.unwrap();
        assert_eq!(kg.kind.as_deref(), Some("Investment vehicle"));
        assert_eq!(kg.attributes["regulator"], "SEC");
    }

    #[test]
    fn tolerates_missing_optional_sections() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.organic.is_empty());
        assert!(resp.knowledge_graph.is_none());

        let resp: SearchResponse =
            serde_json::from_str(r#"{"organic":[{"title":"Only a title"}]}"#).unwrap();
        assert_eq!(resp.organic[0].link, "");
    }
}
