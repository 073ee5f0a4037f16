//! Language-model providers for CopyForge.
//!
//! Both providers implement `copyforge_core::Provider`. The router maps each
//! pipeline stage to the provider assigned to it in configuration.

pub mod anthropic;
pub mod openai;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use router::{ProviderRouter, build_from_config};
