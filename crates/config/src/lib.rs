//! Configuration loading, validation, and persistence for CopyForge.
//!
//! Loads configuration from `~/.copyforge/config.toml` with environment
//! variable overrides for credentials. The resulting `AppConfig` is built once
//! and handed to each component at construction; nothing reads it globally.
//!
//! Credentials are not checked at startup. A missing key surfaces as
//! `ConfigError::MissingCredential` the first time a component asks for it.

use copyforge_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.copyforge/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credentials per external service
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Which model provider authors each stage (stage name → provider)
    #[serde(default = "default_stage_providers")]
    pub stage_providers: BTreeMap<String, ProviderKind>,

    /// Model selection and sampling settings
    #[serde(default)]
    pub models: ModelConfig,

    /// Reference table locations
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Web search collaborator settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Content formatter defaults
    #[serde(default)]
    pub formatter: FormatterConfig,

    /// Fixed brand parameters used by `copyforge run`
    #[serde(default)]
    pub brand: BrandProfile,

    /// Runtime state (checkpoints)
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ── Services and providers ──────────────────────────────────────────────────

/// An external service that needs a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Serper,
    Anthropic,
    OpenAi,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Serper, Service::Anthropic, Service::OpenAi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Serper => "serper",
            Service::Anthropic => "anthropic",
            Service::OpenAi => "openai",
        }
    }

    /// Environment variable consulted when the config file has no key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Service::Serper => "SERPER_API_KEY",
            Service::Anthropic => "ANTHROPIC_API_KEY",
            Service::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for Service {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serper" => Ok(Service::Serper),
            "anthropic" => Ok(Service::Anthropic),
            "openai" => Ok(Service::OpenAi),
            other => Err(ConfigError::UnsupportedService(other.to_string())),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A language-model provider a stage can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// The credential this provider needs.
    pub fn service(&self) -> Service {
        match self {
            ProviderKind::Anthropic => Service::Anthropic,
            ProviderKind::OpenAi => Service::OpenAi,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(ConfigError::InvalidProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages authored by the leader and copywriter use Anthropic; research and
/// revision use OpenAI.
fn default_stage_providers() -> BTreeMap<String, ProviderKind> {
    [
        ("initialization", ProviderKind::Anthropic),
        ("brief_dispatch", ProviderKind::Anthropic),
        ("web_research", ProviderKind::OpenAi),
        ("content_creation", ProviderKind::Anthropic),
        ("revision", ProviderKind::OpenAi),
        ("finalization", ProviderKind::Anthropic),
    ]
    .into_iter()
    .map(|(stage, provider)| (stage.to_string(), provider))
    .collect()
}

// ── Sections ────────────────────────────────────────────────────────────────

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
}

impl ApiKeys {
    fn slot(&self, service: Service) -> &Option<String> {
        match service {
            Service::Serper => &self.serper,
            Service::Anthropic => &self.anthropic,
            Service::OpenAi => &self.openai,
        }
    }

    fn slot_mut(&mut self, service: Service) -> &mut Option<String> {
        match service {
            Service::Serper => &mut self.serper,
            Service::Anthropic => &mut self.anthropic,
            Service::OpenAi => &mut self.openai,
        }
    }

    /// The key for a service, treating blank strings as absent.
    pub fn get(&self, service: Service) -> Option<&str> {
        self.slot(service)
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("serper", &redact(&self.serper))
            .field("anthropic", &redact(&self.anthropic))
            .field("openai", &redact(&self.openai))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_openai_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl ModelConfig {
    /// The model name configured for a provider.
    pub fn model_for(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::Anthropic => &self.anthropic_model,
            ProviderKind::OpenAi => &self.openai_model,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            anthropic_model: default_anthropic_model(),
            openai_model: default_openai_model(),
            anthropic_base_url: None,
            openai_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Where the three reference tables live. Table paths are relative to
/// `base_dir` unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_reference_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_brand_info_path")]
    pub brand_info: PathBuf,

    #[serde(default = "default_best_practices_path")]
    pub best_practices: PathBuf,

    #[serde(default = "default_compliance_info_path")]
    pub compliance_info: PathBuf,
}

fn default_reference_dir() -> PathBuf {
    PathBuf::from("RAG")
}
fn default_brand_info_path() -> PathBuf {
    PathBuf::from("Rag 1").join("brand_info.csv")
}
fn default_best_practices_path() -> PathBuf {
    PathBuf::from("Rag 2").join("best_practices.csv")
}
fn default_compliance_info_path() -> PathBuf {
    PathBuf::from("Rag 3").join("compliance_info.csv")
}

impl ReferenceConfig {
    /// Reference layout rooted at `base_dir` with the default file names.
    pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_reference_dir(),
            brand_info: default_brand_info_path(),
            best_practices: default_best_practices_path(),
            compliance_info: default_compliance_info_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Results requested per query (1–100)
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total attempts per query, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_num_results() -> usize {
    5
}
fn default_language() -> String {
    "en".into()
}
fn default_user_agent() -> String {
    concat!("CopyForge/", env!("CARGO_PKG_VERSION")).into()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}

impl SearchConfig {
    /// The retry policy the search collaborator applies.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts).with_backoff(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            num_results: default_num_results(),
            language: default_language(),
            user_agent: default_user_agent(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    #[serde(default = "default_true")]
    pub include_disclaimers: bool,

    /// Disclaimer text; blank means the built-in financial-services text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

fn default_content_type() -> String {
    "blog".into()
}
fn default_true() -> bool {
    true
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            default_content_type: default_content_type(),
            include_disclaimers: true,
            disclaimer: None,
        }
    }
}

/// The fixed brand parameters that accompany every content request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandProfile {
    pub brand_name: String,
    pub tone_of_voice: String,
    pub primary_target: String,
    pub secondary_target: String,
    pub unique_selling_points: String,
    pub brand_colors: String,
    pub keywords: String,
    pub avoid_terms: String,
    /// Outline guidance for the authors (free text, not a formatter template)
    pub structure: String,
    pub ideal_length: String,
    pub required_elements: String,
    pub mandatory_elements: String,
    pub forbidden_elements: String,
    pub disclaimers: String,
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            brand_name: "Siebert Financial".into(),
            tone_of_voice: "Professional, trustworthy, and approachable".into(),
            primary_target: "Individual investors looking for reliable financial services".into(),
            secondary_target: "Financial advisors and wealth management professionals".into(),
            unique_selling_points:
                "Over 50 years of experience, personalized service, competitive fees".into(),
            brand_colors: "Blue and white".into(),
            keywords: "investment advisory, wealth management, financial planning, retirement planning"
                .into(),
            avoid_terms: "guaranteed returns, risk-free, get rich quick".into(),
            structure:
                "Introduction, Benefits, Services Overview, Client Testimonials, Call to Action".into(),
            ideal_length: "800-1200 words".into(),
            required_elements: "Company history, service descriptions, contact information".into(),
            mandatory_elements: "Regulatory disclosures, fee transparency".into(),
            forbidden_elements: "Specific return promises, competitor criticism".into(),
            disclaimers: "Investment advisory services involve risk. Past performance is not indicative of future results."
                .into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory for run checkpoints
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    AppConfig::config_dir().join("state")
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ── Loading, persistence, accessors ─────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.copyforge/config.toml)
    /// and fill absent credentials from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from a specific path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path. No environment lookups.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Fill credentials missing from the file using `lookup` (normally the
    /// process environment). Keys present in the file are kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in Service::ALL {
            if self.api_keys.get(service).is_some() {
                continue;
            }
            if let Some(value) = lookup(service.env_var()).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(service = %service, "Credential taken from environment");
                *self.api_keys.slot_mut(service) = Some(value);
            }
        }
    }

    /// Persist the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| write_err(e.to_string()))?;

        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".copyforge")
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// The credential for a named service.
    ///
    /// Unknown service names are `UnsupportedService`; a known service with
    /// no key is `MissingCredential`.
    pub fn api_key(&self, service: &str) -> Result<&str, ConfigError> {
        let service: Service = service.parse()?;
        self.api_key_for(service)
    }

    pub fn api_key_for(&self, service: Service) -> Result<&str, ConfigError> {
        self.api_keys
            .get(service)
            .ok_or(ConfigError::MissingCredential(service))
    }

    /// Set (or replace) the credential for a named service.
    pub fn set_api_key(&mut self, service: &str, key: impl Into<String>) -> Result<(), ConfigError> {
        let service: Service = service.parse()?;
        *self.api_keys.slot_mut(service) = Some(key.into());
        tracing::info!(service = %service, "API key updated");
        Ok(())
    }

    /// The provider assigned to a stage. Unassigned stages fall back to OpenAI.
    pub fn stage_provider(&self, stage: &str) -> ProviderKind {
        match self.stage_providers.get(stage) {
            Some(provider) => *provider,
            None => {
                tracing::warn!(stage, "No provider assigned to stage, using openai");
                ProviderKind::OpenAi
            }
        }
    }

    /// Assign a provider to a stage.
    pub fn set_stage_provider(&mut self, stage: &str, provider: &str) -> Result<(), ConfigError> {
        let provider: ProviderKind = provider.parse()?;
        self.stage_providers.insert(stage.to_string(), provider);
        tracing::info!(stage, provider = %provider, "Stage provider updated");
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.models.temperature) {
            return Err(ConfigError::ValidationError(
                "models.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.search.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_attempts must be at least 1".into(),
            ));
        }

        if !(1..=100).contains(&self.search.num_results) {
            return Err(ConfigError::ValidationError(
                "search.num_results must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            stage_providers: default_stage_providers(),
            models: ModelConfig::default(),
            reference: ReferenceConfig::default(),
            search: SearchConfig::default(),
            formatter: FormatterConfig::default(),
            brand: BrandProfile::default(),
            runtime: RuntimeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unsupported service: {0}")]
    UnsupportedService(String),

    #[error("Missing {0} API key - set {env} or add it to config.toml", env = .0.env_var())]
    MissingCredential(Service),

    #[error("Invalid model provider: {0}. Must be 'anthropic' or 'openai'")]
    InvalidProvider(String),
}

impl From<ConfigError> for copyforge_core::Error {
    fn from(err: ConfigError) -> Self {
        copyforge_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.max_attempts, 3);
        assert_eq!(config.formatter.default_content_type, "blog");
        assert_eq!(config.brand.brand_name, "Siebert Financial");
    }

    #[test]
    fn config_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.set_api_key("serper", "serper-test").unwrap();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api_keys.get(Service::Serper), Some("serper-test"));
        assert_eq!(parsed.stage_providers, config.stage_providers);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.models.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = AppConfig::default();
        config.search.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.search.num_results, 5);
    }

    #[test]
    fn unsupported_service_is_rejected() {
        let config = AppConfig::default();
        let err = config.api_key("bing").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedService(ref s) if s == "bing"));
    }

    #[test]
    fn missing_credential_surfaces_on_use() {
        let config = AppConfig::default();
        let err = config.api_key("Serper").unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(Service::Serper)));
        assert!(err.to_string().contains("SERPER_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.set_api_key("openai", "   ").unwrap();
        assert!(config.api_key("openai").is_err());
    }

    #[test]
    fn env_fills_only_absent_keys() {
        let mut config = AppConfig::default();
        config.set_api_key("anthropic", "from-file").unwrap();
        config.apply_env(|name| match name {
            "ANTHROPIC_API_KEY" => Some("from-env".into()),
            "SERPER_API_KEY" => Some("serper-env".into()),
            _ => None,
        });
        assert_eq!(config.api_key("anthropic").unwrap(), "from-file");
        assert_eq!(config.api_key("serper").unwrap(), "serper-env");
        assert!(config.api_key("openai").is_err());
    }

    #[test]
    fn stage_provider_defaults_and_overrides() {
        let mut config = AppConfig::default();
        assert_eq!(config.stage_provider("web_research"), ProviderKind::OpenAi);
        assert_eq!(config.stage_provider("content_creation"), ProviderKind::Anthropic);
        assert_eq!(config.stage_provider("unknown_stage"), ProviderKind::OpenAi);

        config.set_stage_provider("web_research", "Anthropic").unwrap();
        assert_eq!(config.stage_provider("web_research"), ProviderKind::Anthropic);

        let err = config.set_stage_provider("revision", "mistral").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProvider(_)));
    }

    #[test]
    fn save_and_reload_persists_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.set_api_key("serper", "persisted").unwrap();
        config.set_stage_provider("revision", "anthropic").unwrap();
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.api_key("serper").unwrap(), "persisted");
        assert_eq!(reloaded.stage_provider("revision"), ProviderKind::Anthropic);
    }

    #[test]
    fn partial_file_uses_section_defaults() {
        let toml_str = r#"
[search]
num_results = 8

[stage_providers]
web_research = "anthropic"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.num_results, 8);
        assert_eq!(config.search.max_attempts, 3);
        assert_eq!(config.stage_provider("web_research"), ProviderKind::Anthropic);
        assert_eq!(config.reference.base_dir, PathBuf::from("RAG"));
    }

    #[test]
    fn retry_policy_follows_search_settings() {
        let mut config = AppConfig::default();
        config.search.max_attempts = 4;
        config.search.initial_backoff_ms = 10;
        let policy = config.search.retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_backoff, Duration::from_millis(10));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut config = AppConfig::default();
        config.set_api_key("openai", "sk-secret").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
