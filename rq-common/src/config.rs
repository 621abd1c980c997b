//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: callers log a
//! warning and continue with defaults.

use crate::models::SearchMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ROOT_FOLDER_ENV: &str = "RADIOQUEST_ROOT_FOLDER";
pub const CONFIG_FILE_ENV: &str = "RADIOQUEST_CONFIG";
pub const TTS_API_KEY_ENV: &str = "RADIOQUEST_TTS_API_KEY";
pub const PORT_ENV: &str = "PORT";

pub const DATABASE_FILE_NAME: &str = "radioquest.db";
pub const AUDIO_DIR_NAME: &str = "audio";
pub const CONFIG_FILE_NAME: &str = "radioquest.toml";

const DEFAULT_PORT: u16 = 8080;

/// Contents of `radioquest.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub tts: TtsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// When false the service runs on fallback data only
    pub enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// Number of semantic results returned
    pub top_k: usize,
    /// Size of the nearest-candidate set kept while scoring the index
    pub num_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Lexical,
            top_k: 5,
            num_candidates: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub voice_name: String,
    pub language_code: String,
    pub endpoint: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            voice_name: "en-NG-Wavenet-A".to_string(),
            language_code: "en-NG".to_string(),
            endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
        }
    }
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Values given on the command line; each overrides every other source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub search_mode: Option<SearchMode>,
}

/// Settings resolved once at startup and handed to each service
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub root_folder: PathBuf,
    pub bind: String,
    pub log_level: String,
    pub database_enabled: bool,
    pub search: SearchConfig,
    /// `api_key` here is already resolved (environment beats TOML)
    pub tts: TtsConfig,
}

impl RuntimeConfig {
    /// Merge command-line overrides, environment and TOML into one config
    pub fn resolve(overrides: &Overrides, toml_config: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), &toml_config);

        let bind = overrides.bind.clone().unwrap_or_else(|| {
            let port = port_from_env();
            match (toml_config.bind.as_deref(), port) {
                (Some(toml_bind), Some(port)) => with_port(toml_bind, port),
                (Some(toml_bind), None) => toml_bind.to_string(),
                (None, port) => format!("127.0.0.1:{}", port.unwrap_or(DEFAULT_PORT)),
            }
        });

        let mut search = toml_config.search;
        if let Some(mode) = overrides.search_mode {
            search.mode = mode;
        }

        let mut tts = toml_config.tts;
        tts.api_key = resolve_tts_api_key(tts.api_key.as_deref());

        Self {
            root_folder,
            bind,
            log_level: toml_config.logging.level,
            database_enabled: toml_config.database.enabled,
            search,
            tts,
        }
    }

    /// Config rooted at `root_folder` with every other value at its default
    pub fn with_root(root_folder: impl Into<PathBuf>) -> Self {
        let defaults = TomlConfig::default();
        Self {
            root_folder: root_folder.into(),
            bind: format!("127.0.0.1:{}", DEFAULT_PORT),
            log_level: defaults.logging.level,
            database_enabled: defaults.database.enabled,
            search: defaults.search,
            tts: defaults.tts,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root_folder.join(AUDIO_DIR_NAME)
    }

    /// Create the root folder if missing
    pub fn ensure_root_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }
}

/// Resolve the root folder following the priority order in the module docs
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Locate the TOML config file: CLI path, then environment, then the
/// per-user config directory. Returns None when no file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// `~/.config/radioquest/radioquest.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("radioquest").join(CONFIG_FILE_NAME))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("radioquest"))
        .unwrap_or_else(|| PathBuf::from("./radioquest_data"))
}

/// `PORT` environment variable, if set to a valid port number
fn port_from_env() -> Option<u16> {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.trim().parse::<u16>().ok())
}

/// Replace the port of a `host:port` bind address
pub fn with_port(bind: &str, port: u16) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", bind, port),
    }
}

/// Environment variable wins over the TOML value; blank keys count as unset.
/// Surrounding quotes are stripped, since keys pasted into env files often
/// carry them.
fn resolve_tts_api_key(toml_key: Option<&str>) -> Option<String> {
    let env_key = std::env::var(TTS_API_KEY_ENV).ok();
    env_key
        .as_deref()
        .into_iter()
        .chain(toml_key)
        .map(|k| k.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .find(|k| is_valid_key(k))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
