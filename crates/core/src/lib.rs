//! # CopyForge Core
//!
//! Domain types, traits, and error definitions for the CopyForge content
//! pipeline. This crate has no framework dependencies; every other crate
//! implements against the model defined here.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait here and an implementation elsewhere:
//! - `Provider`: the language model that authors and revises text
//! - `SearchCollaborator`: the outbound web-search API
//! - `Tool`: a capability a pipeline stage may invoke
//!
//! Tests swap in scripted implementations without touching the network.

pub mod error;
pub mod message;
pub mod provider;
pub mod retry;
pub mod search;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retry::RetryPolicy;
pub use search::{KnowledgeGraph, OrganicResult, SearchCollaborator, SearchResponse};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
