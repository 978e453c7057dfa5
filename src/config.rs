//! Configuration for idea-review.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (IDEA_REVIEW_HOME, credentials)
//! 2. Config file (.idea-review/config.yaml)
//! 3. Defaults (./agent)
//!
//! Config file discovery:
//! - Searches current directory and parents for .idea-review/config.yaml
//! - Paths in config file are relative to the directory holding .idea-review/

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::{EmailSettings, GeminiSettings};
use crate::core::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const CONFIG_DIR: &str = ".idea-review";
pub const ENV_HOME: &str = "IDEA_REVIEW_HOME";
pub const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";
pub const ENV_RESEND_KEY: &str = "RESEND_API_KEY";
pub const ENV_USER_EMAIL: &str = "USER_EMAIL";

const DEFAULT_ROOT: &str = "agent";
const DEFAULT_PROMPT_FILE: &str = "design/system-prompt.md";

/// Problems that stop a run before any idea is touched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingGeminiKey,

    #[error("USER_EMAIL is not set but email delivery is enabled (set it, or pass --no-email)")]
    MissingRecipient,
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Queue root (relative to the project directory)
    pub root: Option<String>,
    /// Instruction prompt for the analysis model
    pub prompt_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueConfig {
    /// Glob patterns for idea file names
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiConfig {
    pub analysis_model: Option<String>,
    pub speech_model: Option<String>,
    pub voice_name: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    pub from: Option<String>,
    pub subject: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Queue root holding `user-ideas/` and `feedback/`
    pub root: PathBuf,
    /// Prompt file (may not exist)
    pub prompt_file: PathBuf,
    /// Idea file patterns; empty matches everything
    pub include: Vec<String>,
    pub gemini: GeminiSettings,
    pub email: EmailSettings,
    pub retry: RetryPolicy,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn ideas_dir(&self) -> PathBuf {
        paths::ideas_dir(&self.root)
    }

    pub fn feedback_dir(&self) -> PathBuf {
        paths::feedback_dir(&self.root)
    }

    pub fn journal_path(&self) -> PathBuf {
        paths::journal_path(&self.root)
    }
}

/// Secrets, read from the environment only
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub resend_api_key: Option<String>,
    pub user_email: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            gemini_api_key: get(ENV_GEMINI_KEY),
            resend_api_key: get(ENV_RESEND_KEY),
            user_email: get(ENV_USER_EMAIL),
        }
    }

    pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::MissingGeminiKey)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
        f.debug_struct("Credentials")
            .field("gemini_api_key", &set(&self.gemini_api_key))
            .field("resend_api_key", &set(&self.resend_api_key))
            .field("user_email", &self.user_email)
            .finish()
    }
}

/// Whether this run sends email, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    Disabled { reason: String },
    Enabled { api_key: String, recipient: String },
}

/// Decide delivery from the flag and the environment.
///
/// `--no-email` wins over everything; a missing Resend key disables
/// delivery; a key without a recipient is a configuration error.
pub fn resolve_delivery(
    no_email: bool,
    resend_api_key: Option<&str>,
    user_email: Option<&str>,
) -> Result<DeliveryPlan, ConfigError> {
    if no_email {
        return Ok(DeliveryPlan::Disabled {
            reason: "--no-email given".to_string(),
        });
    }

    let Some(api_key) = resend_api_key else {
        return Ok(DeliveryPlan::Disabled {
            reason: format!("{} not set", ENV_RESEND_KEY),
        });
    };

    let recipient = user_email.ok_or(ConfigError::MissingRecipient)?;

    Ok(DeliveryPlan::Enabled {
        api_key: api_key.to_string(),
        recipient: recipient.to_string(),
    })
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration starting the file search at `start`
pub fn load_config_from(start: &Path, home_override: Option<PathBuf>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(start);

    let (file, base_dir) = match &config_file {
        Some(config_path) => {
            let file = load_config_file(config_path)?;
            // Parent of .idea-review/
            let base_dir = config_path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(start)
                .to_path_buf();
            (file, base_dir)
        }
        None => (ConfigFile::default(), start.to_path_buf()),
    };

    let root = match home_override {
        Some(home) => home,
        None => resolve_path(&base_dir, file.paths.root.as_deref().unwrap_or(DEFAULT_ROOT)),
    };

    let prompt_file = resolve_path(
        &base_dir,
        file.paths
            .prompt_file
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_FILE),
    );

    let mut gemini = GeminiSettings::default();
    if let Some(model) = file.gemini.analysis_model {
        gemini.analysis_model = model;
    }
    if let Some(model) = file.gemini.speech_model {
        gemini.speech_model = model;
    }
    if let Some(voice) = file.gemini.voice_name {
        gemini.voice_name = voice;
    }
    if let Some(secs) = file.gemini.timeout_seconds {
        gemini.timeout = Duration::from_secs(secs);
    }

    let mut email = EmailSettings::default();
    if let Some(from) = file.email.from {
        email.from = from;
    }
    if let Some(subject) = file.email.subject {
        email.subject = subject;
    }

    Ok(ResolvedConfig {
        root,
        prompt_file,
        include: file.queue.include,
        gemini,
        email,
        retry: file.retry.unwrap_or_default(),
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let home_override = std::env::var(ENV_HOME)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    load_config_from(&cwd, home_override)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
