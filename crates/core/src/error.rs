//! Error types for the CopyForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all CopyForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Reference data errors ---
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    // --- Web search errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Formatting errors ---
    #[error("Formatting error: {0}")]
    Formatting(#[from] FormattingError),

    // --- Pipeline errors ---
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} - {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool not configured: {tool_name} - {reason}")]
    NotConfigured { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the reference-table layer.
///
/// `InvalidCategory` is a caller mistake and is always propagated. The other
/// variants are retrieval failures that `ReferenceStore::load_or_empty`
/// degrades to an empty table.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Invalid reference category '{0}'. Valid options are: brand_info, best_practices, compliance_info")]
    InvalidCategory(String),

    #[error("Cannot read reference file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Malformed reference file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Cannot write reference file {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl ReferenceError {
    /// Whether this is a load failure that may be degraded to an empty table.
    pub fn is_retrieval_failure(&self) -> bool {
        !matches!(self, ReferenceError::InvalidCategory(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Missing {service} API key - check configuration")]
    MissingCredential { service: String },

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("API request failed: {status_code} - {body}")]
    Status { status_code: u16, body: String },

    #[error("Invalid or missing API credentials (status {status_code})")]
    Unauthorized { status_code: u16 },

    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Transport failures and server-side (5xx) statuses are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Transport(_) => true,
            SearchError::Status { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormattingError {
    #[error("Structure template is empty")]
    EmptyTemplate,

    #[error("Invalid structure template '{template}': {reason}")]
    InvalidStructure { template: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("Checkpoint is missing output for stage '{missing}' needed to resume at '{resume_at}'")]
    IncompleteCheckpoint { resume_at: String, missing: String },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Formatting failed: {0}")]
    Formatting(#[from] FormattingError),
}
