//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `CHATBRIDGE_CONFIG`), then applies the
//! `CHATBRIDGE_LOG_LEVEL` and `CHATBRIDGE_BIND` overrides. The inference
//! credential comes from `HUGGINGFACEHUB_API_TOKEN` only, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Env var holding the bearer credential for the hosted inference endpoint.
pub const API_TOKEN_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address the chat page and API are served on.
    pub bind: String,
}

/// Comms subsystem configuration.
#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub http: HttpConfig,
}

/// Hugging Face router provider configuration (`[llm.huggingface]`).
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model repository name, sent as `model` in the request body.
    pub repo_id: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    pub max_new_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider (`"huggingface"` or `"dummy"`).
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    pub huggingface: HuggingFaceConfig,
}

impl LlmConfig {
    /// Whether the active provider cannot work without an API token.
    pub fn requires_api_key(&self) -> bool {
        self.provider == "huggingface"
    }

    /// Model name of the active provider, for logs and health output.
    pub fn model_name(&self) -> &str {
        match self.provider.as_str() {
            "huggingface" => &self.huggingface.repo_id,
            _ => "echo",
        }
    }
}

/// Session registry configuration (`[sessions]`).
#[derive(Debug, Clone)]
pub struct SessionsConfig {
    /// Sessions idle for longer than this are torn down.
    pub idle_ttl_seconds: u64,
    /// How often the expiry sweep runs.
    pub sweep_interval_seconds: u64,
    /// Send only the last N turns as context. `None` sends the full history.
    pub context_window: Option<usize>,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Heading shown on the chat page.
    pub title: String,
    pub log_level: String,
    /// Directory holding the prompt template layers.
    pub prompts_dir: PathBuf,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    pub sessions: SessionsConfig,
    /// From `HUGGINGFACEHUB_API_TOKEN`. Required when the provider needs it.
    pub llm_api_key: Option<String>,
}

/// Values taken from the process environment, passed explicitly so tests
/// never have to mutate env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub api_token: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("CHATBRIDGE_LOG_LEVEL").ok(),
            bind: env::var("CHATBRIDGE_BIND").ok(),
            api_token: env::var(API_TOKEN_ENV).ok(),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    sessions: RawSessions,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            title: default_title(),
            log_level: default_log_level(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize)]
struct RawHttp {
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    huggingface: RawHuggingFace,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), huggingface: RawHuggingFace::default() }
    }
}

#[derive(Deserialize)]
struct RawHuggingFace {
    #[serde(default = "default_hf_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_hf_repo_id")]
    repo_id: String,
    #[serde(default = "default_hf_temperature")]
    temperature: f32,
    #[serde(default = "default_hf_max_new_tokens")]
    max_new_tokens: u32,
    #[serde(default = "default_hf_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawHuggingFace {
    fn default() -> Self {
        Self {
            api_base_url: default_hf_api_base_url(),
            repo_id: default_hf_repo_id(),
            temperature: default_hf_temperature(),
            max_new_tokens: default_hf_max_new_tokens(),
            timeout_seconds: default_hf_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawSessions {
    #[serde(default = "default_idle_ttl_seconds")]
    idle_ttl_seconds: u64,
    #[serde(default = "default_sweep_interval_seconds")]
    sweep_interval_seconds: u64,
    #[serde(default)]
    context_window: Option<usize>,
}

impl Default for RawSessions {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: default_idle_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            context_window: None,
        }
    }
}

fn default_title() -> String { "Chatbot".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_http_bind() -> String { "127.0.0.1:7860".to_string() }
fn default_llm_provider() -> String { "huggingface".to_string() }
fn default_hf_api_base_url() -> String { "https://router.huggingface.co/v1/chat/completions".to_string() }
fn default_hf_repo_id() -> String { "deepseek-ai/DeepSeek-V3-0324".to_string() }
fn default_hf_temperature() -> f32 { 0.7 }
fn default_hf_max_new_tokens() -> u32 { 2000 }
fn default_hf_timeout_seconds() -> u64 { 120 }
fn default_idle_ttl_seconds() -> u64 { 3600 }
fn default_sweep_interval_seconds() -> u64 { 60 }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `CHATBRIDGE_CONFIG` or `config/default.toml`, then apply
/// env overrides.
///
/// A missing `config/default.toml` falls back to built-in defaults; a missing
/// file named explicitly by `CHATBRIDGE_CONFIG` is an error.
pub fn load() -> Result<Config, AppError> {
    let overrides = Overrides::from_env();
    match env::var("CHATBRIDGE_CONFIG") {
        Ok(path) => load_from(&expand_home(&path), overrides),
        Err(_) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_from(path, overrides)
            } else {
                resolve(RawConfig::default(), overrides)
            }
        }
    }
}

/// Internal loader: explicit path and overrides.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: Overrides) -> Result<Config, AppError> {
    let hf = parsed.llm.huggingface;
    let config = Config {
        title: parsed.app.title,
        log_level: overrides.log_level.unwrap_or(parsed.app.log_level),
        prompts_dir: expand_home(&parsed.app.prompts_dir),
        comms: CommsConfig {
            http: HttpConfig { bind: overrides.bind.unwrap_or(parsed.comms.http.bind) },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            huggingface: HuggingFaceConfig {
                api_base_url: hf.api_base_url,
                repo_id: hf.repo_id,
                temperature: hf.temperature,
                max_new_tokens: hf.max_new_tokens,
                timeout_seconds: hf.timeout_seconds,
            },
        },
        sessions: SessionsConfig {
            idle_ttl_seconds: parsed.sessions.idle_ttl_seconds,
            sweep_interval_seconds: parsed.sessions.sweep_interval_seconds,
            context_window: parsed.sessions.context_window,
        },
        llm_api_key: overrides.api_token.filter(|t| !t.trim().is_empty()),
    };
    validate(&config)?;
    Ok(config)
}

/// Reject configs that would only fail later, on the first chat turn.
fn validate(config: &Config) -> Result<(), AppError> {
    if config.llm.requires_api_key() && config.llm_api_key.is_none() {
        return Err(AppError::Config(format!(
            "{API_TOKEN_ENV} is not set (required by llm provider '{}')",
            config.llm.provider
        )));
    }
    if config.sessions.context_window == Some(0) {
        return Err(AppError::Config("sessions.context_window must be at least 1".into()));
    }
    if config.sessions.sweep_interval_seconds == 0 {
        return Err(AppError::Config("sessions.sweep_interval_seconds must be at least 1".into()));
    }
    if config.llm.huggingface.max_new_tokens == 0 {
        return Err(AppError::Config("llm.huggingface.max_new_tokens must be at least 1".into()));
    }
    if config.llm.huggingface.timeout_seconds == 0 {
        return Err(AppError::Config("llm.huggingface.timeout_seconds must be at least 1".into()));
    }
    // Full directive strings (`chatbridge=debug,reqwest=warn`) are left to EnvFilter.
    let bare_level = !config.log_level.contains(['=', ',']);
    if bare_level {
        crate::logger::parse_level(&config.log_level)
            .map_err(|e| AppError::Config(format!("app.log_level: {e}")))?;
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Config for tests: dummy provider, no API key, no external calls.
impl Config {
    pub fn test_default() -> Self {
        Self {
            title: "test".into(),
            log_level: "info".into(),
            prompts_dir: PathBuf::from("/nonexistent/prompts"),
            comms: CommsConfig { http: HttpConfig { bind: "127.0.0.1:0".into() } },
            llm: LlmConfig {
                provider: "dummy".into(),
                huggingface: HuggingFaceConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    repo_id: "test/model".into(),
                    temperature: 0.0,
                    max_new_tokens: 16,
                    timeout_seconds: 1,
                },
            },
            sessions: SessionsConfig {
                idle_ttl_seconds: 60,
                sweep_interval_seconds: 1,
                context_window: None,
            },
            llm_api_key: None,
        }
    }
}
