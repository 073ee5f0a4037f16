//! Reference search tool: keyword lookup over the reference tables.

use async_trait::async_trait;
use copyforge_core::error::{ReferenceError, ToolError};
use copyforge_core::tool::{Tool, ToolResult};
use copyforge_reference::{Category, ReferenceStore};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Outcome of a reference lookup. `NoMatches` and `EmptyTable` are normal
/// results, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    Matches {
        category: Category,
        query: String,
        entries: Vec<(String, String)>,
    },
    NoMatches {
        category: Category,
        query: String,
    },
    EmptyTable {
        category: Category,
    },
}

impl RetrievalOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, RetrievalOutcome::Matches { .. })
    }

    pub fn entries(&self) -> &[(String, String)] {
        match self {
            RetrievalOutcome::Matches { entries, .. } => entries,
            _ => &[],
        }
    }
}

impl fmt::Display for RetrievalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalOutcome::Matches {
                category,
                query,
                entries,
            } => {
                writeln!(
                    f,
                    "Found {} related entries for '{query}' in {category}:",
                    entries.len()
                )?;
                for (key, value) in entries {
                    writeln!(f, "- {key}: {value}")?;
                }
                Ok(())
            }
            RetrievalOutcome::NoMatches { category, query } => write!(
                f,
                "Warning: No exact matches found for '{query}' in {category}. Consider using different search terms."
            ),
            RetrievalOutcome::EmptyTable { category } => {
                write!(f, "No reference data available in {category}.")
            }
        }
    }
}

/// Searches one reference category for entries mentioning any query term.
pub struct ReferenceSearchTool {
    store: ReferenceStore,
}

impl ReferenceSearchTool {
    pub fn new(store: ReferenceStore) -> Self {
        Self { store }
    }

    /// Look up `query` in the named category.
    ///
    /// Only an unknown category is an error. An unreadable table is treated
    /// as empty.
    pub fn search(&self, category: &str, query: &str) -> Result<RetrievalOutcome, ReferenceError> {
        let category: Category = category.parse()?;
        let table = self.store.load_or_empty(category);

        if table.is_empty() {
            return Ok(RetrievalOutcome::EmptyTable { category });
        }

        let result = table.search(query);
        if result.is_empty() {
            warn!(category = %category, query, "No reference entries matched");
            return Ok(RetrievalOutcome::NoMatches {
                category,
                query: query.to_string(),
            });
        }

        debug!(category = %category, query, matches = result.len(), "Reference entries matched");
        Ok(RetrievalOutcome::Matches {
            category,
            query: query.to_string(),
            entries: result.into_entries(),
        })
    }
}

#[async_trait]
impl Tool for ReferenceSearchTool {
    fn name(&self) -> &str {
        "reference_search"
    }

    fn description(&self) -> &str {
        "Search the reference tables (brand_info, best_practices, or compliance_info) for entries matching any query term."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "enum": ["brand_info", "best_practices", "compliance_info"],
                    "description": "The reference table to search"
                },
                "query": {
                    "type": "string",
                    "description": "Free-text query; matched term by term"
                }
            },
            "required": ["category", "query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let category = arguments["category"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'category' argument".into()))?;
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let outcome = self
            .search(category, query)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let data = serde_json::to_value(&outcome).unwrap_or_default();
        Ok(ToolResult::ok(outcome.to_string()).with_data(data))
    }
}
