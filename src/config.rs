//! Configuration loading and credential resolution.
//!
//! askdocs runs with no configuration file at all: every section has a
//! default matching the classic behavior (documents in `data/`, ephemeral
//! index, `gpt-3.5-turbo`, top-1 retrieval, full history). An optional
//! TOML file overrides any of it:
//!
//! ```toml
//! [documents]
//! dir = "knowledge"
//!
//! [index]
//! mode = "persistent"
//! path = "persist"
//!
//! [history]
//! policy = "window"
//! turns = 6
//! ```
//!
//! The API key never lives in the file. It comes from an environment
//! variable, or failing that from a small fallback file holding
//! `APIKEY = "..."`.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::Turn;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "askdocs.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub index: IndexMode,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub history: HistoryPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// File consulted when the environment variable is unset.
    pub fallback_file: PathBuf,
    pub base_url: String,
    /// Request timeout. Unset means the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            fallback_file: PathBuf::from("constants.toml"),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentsConfig {
    pub dir: PathBuf,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/"),
            include_globs: vec!["**/*".to_string()],
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

/// How the vector index is acquired at startup.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IndexMode {
    /// Rebuild the index from the document directory on every run.
    #[default]
    Ephemeral,
    /// Reuse the index stored under `path`, building it on first run.
    Persistent {
        #[serde(default = "default_persist_dir")]
        path: PathBuf,
    },
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("persist")
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Texts per embeddings request.
    pub batch_size: usize,
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 64,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_retries: 0,
            condense_question: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of nearest chunks supplied as context.
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: 1 }
    }
}

/// Which part of the conversation history is sent with each question.
///
/// The session always keeps every turn; the policy only selects what the
/// chain sees.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Every prior turn, in order.
    #[default]
    Full,
    /// Only the most recent `turns` turns.
    Window { turns: usize },
}

impl HistoryPolicy {
    pub fn select<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        match *self {
            HistoryPolicy::Full => history,
            HistoryPolicy::Window { turns } => {
                &history[history.len().saturating_sub(turns)..]
            }
        }
    }
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// read when present and built-in defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| Error::Config(format!("failed to parse config file: {}", e)))?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".into(),
            ));
        }
        if self.retrieval.k == 0 {
            return Err(Error::Config("retrieval.k must be >= 1".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be > 0".into()));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(Error::Config(
                "chat.temperature must be in [0.0, 2.0]".into(),
            ));
        }
        if let HistoryPolicy::Window { turns: 0 } = self.history {
            return Err(Error::Config("history.turns must be > 0".into()));
        }
        Ok(())
    }
}

// ============ Credentials ============

/// The API credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Deserialize)]
struct FallbackCredentials {
    #[serde(rename = "APIKEY")]
    api_key: Option<String>,
}

/// Resolve the API key from the environment, then from the fallback file.
pub fn resolve_api_key(config: &OpenAiConfig) -> Result<ApiKey> {
    let from_env = std::env::var(&config.api_key_env).ok();
    resolve_api_key_from(from_env, config)
}

/// Resolution logic with the environment value supplied by the caller.
///
/// An empty environment value counts as unset.
pub fn resolve_api_key_from(env_value: Option<String>, config: &OpenAiConfig) -> Result<ApiKey> {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        return Ok(ApiKey::new(key));
    }

    if let Some(key) = read_fallback_key(&config.fallback_file)? {
        return Ok(ApiKey::new(key));
    }

    Err(Error::Config(format!(
        "API key not found. Set the {} environment variable or add APIKEY to {}.",
        config.api_key_env,
        config.fallback_file.display()
    )))
}

fn read_fallback_key(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let parsed: FallbackCredentials = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    Ok(parsed.api_key.filter(|k| !k.trim().is_empty()))
}
