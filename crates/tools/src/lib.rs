//! Stage tools for CopyForge.
//!
//! Tools are what a pipeline stage consults while producing its artifact:
//! keyword search over the reference tables, web search, and the content
//! formatter that structures the final draft.

pub mod formatter;
pub mod reference_search;
pub mod web_search;

use copyforge_config::AppConfig;
use copyforge_core::search::SearchCollaborator;
use copyforge_core::tool::ToolRegistry;
use copyforge_reference::ReferenceStore;
use std::sync::Arc;

pub use formatter::{
    ContentFormatter, ContentFormatterTool, DEFAULT_DISCLAIMER, FormatRequest, FormattedDocument,
    IdentityHook, Section, SectionHook,
};
pub use reference_search::{ReferenceSearchTool, RetrievalOutcome};
pub use web_search::{SerperClient, WebSearchTool, render_results};

/// Create a registry with every stage tool.
///
/// The search collaborator is injected so callers can substitute a mock.
pub fn default_registry(config: &AppConfig, search: Arc<dyn SearchCollaborator>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReferenceSearchTool::new(ReferenceStore::new(
        config.reference.clone(),
    ))));
    registry.register(Box::new(WebSearchTool::new(search, config.search.num_results)));
    registry.register(Box::new(ContentFormatterTool::from_config(&config.formatter)));
    registry
}
