//! TOML-based configuration for Tickerwise
//!
//! Infrastructure settings live in `tickerwise.toml`; secrets never do. The file
//! names the environment variables that hold credentials and model identifiers,
//! and [`Settings::load`] resolves them once at startup (after loading `.env`).
//!
//! The resulting [`Settings`] value is immutable and is shared by reference
//! with every component that needs it. The process environment is read, never
//! written.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tickerwise.toml";

/// Root configuration structure loaded from tickerwise.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerwiseConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub market_data: MarketDataConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    Ollama,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Environment variable containing the model identifier
    #[serde(default = "default_model_env")]
    pub model_env: String,

    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> ProviderKind {
    ProviderKind::Gemini
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_model_env() -> String {
    "MODEL_NAME".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key_env: default_api_key_env(),
            model_env: default_model_env(),
            api_base: None,
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
        }
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Tool-calling rounds a step may take before it must answer
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Injected context length (in chars) above which a warning is logged
    #[serde(default = "default_context_warn_chars")]
    pub context_warn_chars: usize,
}

fn default_max_iterations() -> usize {
    5
}

fn default_context_warn_chars() -> usize {
    60_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            context_warn_chars: default_context_warn_chars(),
        }
    }
}

// ============= Market Data Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_market_data_url")]
    pub base_url: String,

    /// Page visited once to obtain the session cookie that the crumb is tied to
    #[serde(default = "default_session_url")]
    pub session_url: String,

    /// Price history window passed to the chart endpoint (e.g. "1mo")
    #[serde(default = "default_history_range")]
    pub history_range: String,

    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    #[serde(default = "default_market_timeout")]
    pub timeout_secs: u64,
}

fn default_market_data_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}

fn default_session_url() -> String {
    "https://fc.yahoo.com".to_string()
}

fn default_history_range() -> String {
    "1mo".to_string()
}

fn default_news_limit() -> usize {
    5
}

fn default_market_timeout() -> u64 {
    30
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_data_url(),
            session_url: default_session_url(),
            history_range: default_history_range(),
            news_limit: default_news_limit(),
            timeout_secs: default_market_timeout(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_num_results")]
    pub num_results: usize,
}

fn default_num_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
        }
    }
}

// ============= Report Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// HTML-to-PDF renderer binary; `None` disables document rendering
    #[serde(default = "default_renderer")]
    pub renderer: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_renderer() -> Option<PathBuf> {
    Some(PathBuf::from("/usr/local/bin/wkhtmltopdf"))
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            renderer: default_renderer(),
        }
    }
}

// ============= Email Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Environment variable containing the sender address
    #[serde(default = "default_sender_env")]
    pub sender_env: String,

    /// Environment variable containing the SMTP password
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_sender_env() -> String {
    "SENDER_EMAIL".to_string()
}

fn default_password_env() -> String {
    "EMAIL_PASSWORD".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            sender_env: default_sender_env(),
            password_env: default_password_env(),
        }
    }
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),
}

impl TickerwiseConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: TickerwiseConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate values that serde defaults cannot guard
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_iterations must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }

        if self.report.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "report.output_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Credentials for the email dispatcher. Both are optional at startup; the
/// mailer refuses to send while either is missing.
#[derive(Clone, Default)]
pub struct EmailCredentials {
    pub sender: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Fully resolved, immutable runtime settings
#[derive(Clone)]
pub struct Settings {
    pub config: TickerwiseConfig,
    /// Empty for providers that take no key (Ollama)
    pub llm_api_key: String,
    pub model: String,
    pub email: EmailCredentials,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("config", &self.config)
            .field("llm_api_key", &"***")
            .field("model", &self.model)
            .field("email", &self.email)
            .finish()
    }
}

impl Settings {
    /// Load `.env`, read the TOML file and resolve secrets from the environment.
    ///
    /// A missing file is only an error when the caller asked for a specific
    /// path; the default path falls back to built-in defaults.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = if path.exists() || explicit {
            TickerwiseConfig::load(path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            TickerwiseConfig::default()
        };

        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve secrets for `config` through `lookup`.
    pub fn resolve<F>(config: TickerwiseConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        config.validate()?;

        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let model = non_empty(&config.llm.model_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(config.llm.model_env.clone()))?;

        let llm_api_key = match config.llm.provider {
            ProviderKind::Ollama => non_empty(&config.llm.api_key_env).unwrap_or_default(),
            _ => non_empty(&config.llm.api_key_env)
                .ok_or_else(|| ConfigError::MissingEnvVar(config.llm.api_key_env.clone()))?,
        };

        let email = EmailCredentials {
            sender: non_empty(&config.email.sender_env),
            password: non_empty(&config.email.password_env),
        };

        Ok(Self {
            config,
            llm_api_key,
            model,
            email,
        })
    }
}
