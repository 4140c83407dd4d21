//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all, via [`Config::minimal`]) is a valid configuration. CLI flags are
//! applied on top of the loaded values by the caller.

use anyhow::{Context, Result};
use codewhisper_core::rank::DEFAULT_MAX_FILES;
use codewhisper_core::score::DEFAULT_CONTENT_WINDOW;
use codewhisper_core::session::DEFAULT_SYSTEM_PROMPT;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./conversations.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Model identifier sent with every request.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_model_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// API key. Usually left unset here and supplied by the CLI from
    /// `--api-key` or `OPENROUTER_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            url: default_model_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_model_name() -> String {
    "meta-llama/llama-4-maverick:free".to_string()
}
fn default_model_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Upper bound on files held open at once while scoring.
    #[serde(default = "default_max_open_files")]
    pub max_open_files: usize,
    /// Leading characters of each file inspected for keyword matches.
    #[serde(default = "default_content_window")]
    pub content_window: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Directory names skipped entirely (exact match).
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    /// Recognized code file extensions, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_depth: default_max_depth(),
            max_open_files: default_max_open_files(),
            content_window: default_content_window(),
            follow_symlinks: false,
            ignored_dirs: default_ignored_dirs(),
            extensions: default_extensions(),
        }
    }
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}
fn default_max_depth() -> usize {
    3
}
fn default_max_open_files() -> usize {
    64
}
fn default_content_window() -> usize {
    DEFAULT_CONTENT_WINDOW
}

fn default_ignored_dirs() -> Vec<String> {
    [
        "node_modules",
        "dist",
        "build",
        ".git",
        "coverage",
        ".cache",
        ".next",
        "target",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_extensions() -> Vec<String> {
    [
        "ts", "js", "tsx", "jsx", "py", "java", "c", "cpp", "h", "cs", "go", "rb", "php", "swift",
        "kt", "rs", "dart", "json", "html", "css", "scss", "less", "md", "yaml", "yml", "toml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Priming message seeded into every new session.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Config {
    /// All-defaults configuration, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.discovery.max_files == 0 {
            anyhow::bail!("discovery.max_files must be >= 1");
        }
        if self.discovery.max_open_files == 0 {
            anyhow::bail!("discovery.max_open_files must be >= 1");
        }
        if self.discovery.content_window == 0 {
            anyhow::bail!("discovery.content_window must be >= 1");
        }
        if self.discovery.extensions.is_empty() {
            anyhow::bail!("discovery.extensions must not be empty");
        }
        if self.model.timeout_secs == 0 {
            anyhow::bail!("model.timeout_secs must be >= 1");
        }
        if self.model.url.trim().is_empty() {
            anyhow::bail!("model.url must not be empty");
        }
        if self.model.name.trim().is_empty() {
            anyhow::bail!("model.name must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;

    for ext in config.discovery.extensions.iter_mut() {
        *ext = ext.trim_start_matches('.').to_lowercase();
    }

    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.discovery.max_files, 5);
        assert_eq!(cfg.discovery.max_depth, 3);
        assert_eq!(cfg.discovery.content_window, 10_000);
        assert!(cfg.discovery.ignored_dirs.contains(&"node_modules".to_string()));
        assert!(cfg.discovery.extensions.contains(&"rs".to_string()));
        assert_eq!(cfg.db.path, PathBuf::from("./conversations.db"));
        assert!(cfg.model.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = parse_config(
            r#"
            [db]
            path = "/tmp/chat.sqlite"

            [model]
            name = "anthropic/claude-3-haiku"

            [discovery]
            max_files = 8
            extensions = [".RS", "toml"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.db.path, PathBuf::from("/tmp/chat.sqlite"));
        assert_eq!(cfg.model.name, "anthropic/claude-3-haiku");
        assert_eq!(cfg.discovery.max_files, 8);
        assert_eq!(cfg.discovery.extensions, vec!["rs", "toml"]);
        assert_eq!(cfg.discovery.max_depth, 3);
    }

    #[test]
    fn test_rejects_zero_max_files() {
        let err = parse_config("[discovery]\nmax_files = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_files"));
    }

    #[test]
    fn test_rejects_empty_extensions() {
        assert!(parse_config("[discovery]\nextensions = []\n").is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(parse_config("[model]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_minimal() {
        let cfg = load_or_default(Path::new("/definitely/not/here/codewhisper.toml")).unwrap();
        assert_eq!(cfg.discovery.max_files, 5);
    }
}
