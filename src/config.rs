//! Configuration management
//!
//! Config file is stored next to the executable as `config.toml`, falling
//! back to `config/default.toml` in a dev checkout. Every section carries
//! `#[serde(default)]` so a partial file only overrides what it names.

use crate::constants::{
    DEFAULT_APP_VERSION, DEFAULT_EXPORT_FILENAME, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_STORED_LOGS,
    REPLAY_BATCH_DELAY_MS,
};
use crate::error::{DiagError, Result};
use crate::logging::context::StaticContext;
use crate::logging::LogLevel;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub debug_console: DebugConsoleConfig,
    pub paths: PathsConfig,
    /// Fixed runtime answers (url, route, membership id, user agent)
    pub runtime: StaticContext,
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Production mode: INFO default level, terse console, stack redaction
    pub production: bool,
    /// Explicit minimum level; unset means the environment default
    #[serde(
        deserialize_with = "deserialize_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_level: Option<LogLevel>,
    pub emitters: EmitterConfig,
    pub remote_endpoints: Vec<String>,
    pub file: FileConfig,
    pub offline: OfflineConfig,
    /// Analytics store cap
    pub max_stored_logs: usize,
    pub include_stacks_in_production: bool,
    pub app_version: String,
    /// Pause between replay batches (milliseconds)
    pub replay_batch_delay_ms: u64,
    pub filters: FiltersConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            production: false,
            min_level: None,
            emitters: EmitterConfig::default(),
            remote_endpoints: Vec::new(),
            file: FileConfig::default(),
            offline: OfflineConfig::default(),
            max_stored_logs: DEFAULT_MAX_STORED_LOGS,
            include_stacks_in_production: false,
            app_version: DEFAULT_APP_VERSION.to_string(),
            replay_batch_delay_ms: REPLAY_BATCH_DELAY_MS,
            filters: FiltersConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Configured level, or DEBUG in development and INFO in production
    pub fn effective_min_level(&self) -> LogLevel {
        self.min_level.unwrap_or(if self.production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        })
    }

    /// Stacks are dropped in production unless explicitly kept
    pub fn redact_stacks(&self) -> bool {
        self.production && !self.include_stacks_in_production
    }

    pub fn replay_batch_delay(&self) -> Duration {
        Duration::from_millis(self.replay_batch_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub console: bool,
    pub remote: bool,
    pub file: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            console: true,
            remote: false,
            file: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    pub enabled: bool,
    pub max_buffer_size: usize,
    /// Replay automatically on an offline-to-online transition
    pub sync_when_online: bool,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            sync_when_online: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPeriod {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub base_path: PathBuf,
    pub folder_name_prefix: String,
    /// Size at which a file is rotated (bytes)
    pub max_size: u64,
    /// Rotated files kept per artifact
    pub max_files: usize,
    pub compress: bool,
    pub rotation_period: RotationPeriod,
    /// Placeholders: `{prefix}`, `{date}`, `{level}`
    pub filename_pattern: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_path: PathBuf::from("./data/logs"),
            folder_name_prefix: "destiny-app-".to_string(),
            max_size: 10 * 1024 * 1024,
            max_files: 5,
            compress: true,
            rotation_period: RotationPeriod::Daily,
            filename_pattern: "{prefix}log-{date}-{level}.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Sources whose entries are never produced (exact match)
    pub exclude_sources: Vec<String>,
    /// Tags copied into every entry's `filters`
    pub custom: BTreeMap<String, String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        let mut custom = BTreeMap::new();
        custom.insert("environment".to_string(), "development".to_string());
        custom.insert(
            "clientId".to_string(),
            "destiny-inventory-manager".to_string(),
        );
        Self {
            exclude_sources: vec!["polling-service".to_string(), "heartbeat".to_string()],
            custom,
        }
    }
}

// =============================================================================
// Debug console & paths
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConsoleConfig {
    /// Show the console in production even without stored errors
    pub force: bool,
    /// Export filename base
    pub export_filename: String,
}

impl Default for DebugConsoleConfig {
    fn default() -> Self {
        Self {
            force: false,
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Persisted stores live in `<data_dir>/storage`
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            export_dir: PathBuf::from("./data/exports"),
        }
    }
}

impl PathsConfig {
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<Option<LogLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

// =============================================================================
// Validation
// =============================================================================

impl Config {
    pub fn validate(&self) -> Result<()> {
        let logging = &self.logging;
        if logging.max_stored_logs == 0 {
            return Err(DiagError::ConfigValidation {
                field: "logging.max_stored_logs",
                reason: "must be at least 1".into(),
            });
        }
        if logging.offline.max_buffer_size == 0 {
            return Err(DiagError::ConfigValidation {
                field: "logging.offline.max_buffer_size",
                reason: "must be at least 1".into(),
            });
        }
        if logging.file.max_files == 0 {
            return Err(DiagError::ConfigValidation {
                field: "logging.file.max_files",
                reason: "must be at least 1".into(),
            });
        }
        if logging.file.max_size == 0 {
            return Err(DiagError::ConfigValidation {
                field: "logging.file.max_size",
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(bad) = logging
            .remote_endpoints
            .iter()
            .find(|e| !(e.starts_with("http://") || e.starts_with("https://")))
        {
            return Err(DiagError::ConfigValidation {
                field: "logging.remote_endpoints",
                reason: format!("'{}' is not an http(s) URL", bad),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Location & persistence
// =============================================================================

/// Get the project root directory
///
/// Searches in order:
/// 1. Next to executable (production deployment)
/// 2. Up from target/release or target/debug (dev builds)
fn find_project_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| DiagError::ConfigRead {
        path: PathBuf::from("executable"),
        source: e,
    })?;
    let exe_dir = exe.parent().ok_or_else(|| DiagError::ConfigValidation {
        field: "exe_path",
        reason: "no parent directory".into(),
    })?;

    if exe_dir.join("config.toml").exists() || exe_dir.join("config").exists() {
        return Ok(exe_dir.to_path_buf());
    }

    // exe_dir = .../vault-diagnostics/target/release, we want .../vault-diagnostics
    if let Some(target_dir) = exe_dir.parent() {
        if target_dir
            .file_name()
            .map(|n| n == "target")
            .unwrap_or(false)
        {
            if let Some(project_root) = target_dir.parent() {
                if project_root.join("config").exists() {
                    return Ok(project_root.to_path_buf());
                }
            }
        }
    }

    Ok(exe_dir.to_path_buf())
}

/// Get the config file path
///
/// Looks for config.toml, falls back to config/default.toml
pub fn config_path() -> Result<PathBuf> {
    let root = find_project_root()?;

    let user_config = root.join("config.toml");
    if user_config.exists() {
        return Ok(user_config);
    }

    let default_config = root.join("config").join("default.toml");
    if default_config.exists() {
        return Ok(default_config);
    }

    // Created on first save
    Ok(user_config)
}

/// Load config from the default location, creating it if missing
pub fn load() -> Config {
    let path = match config_path() {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to determine config path: {}, using defaults", e);
            return Config::default();
        }
    };

    if !path.exists() {
        let config = Config::default();
        if let Err(e) = save_to(&config, &path) {
            warn!("Failed to create default config: {}", e);
        }
        return config;
    }

    load_from(&path)
}

/// Load config from an explicit path, falling back to defaults on any error
pub fn load_from(path: &Path) -> Config {
    let config = match fs::read_to_string(path) {
        Ok(content) => match parse(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config parse error in {:?}: {}, using defaults", path, e);
                return Config::default();
            }
        },
        Err(e) => {
            warn!("Failed to read config {:?}: {}, using defaults", path, e);
            return Config::default();
        }
    };

    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("{} in {:?}, using defaults", e, path);
            Config::default()
        }
    }
}

pub fn parse(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| DiagError::ConfigValidation {
        field: "config",
        reason: e.to_string(),
    })
}

pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| DiagError::ConfigValidation {
        field: "config",
        reason: e.to_string(),
    })
}

pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    let content = to_toml(config)?;
    fs::write(path, content).map_err(|e| DiagError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_values() {
        let config = LoggingConfig::default();

        assert!(!config.production);
        assert_eq!(config.min_level, None);
        assert_eq!(config.max_stored_logs, 50);
        assert_eq!(config.offline.max_buffer_size, 50);
        assert!(config.emitters.console);
        assert!(!config.emitters.remote);
        assert!(!config.emitters.file);
        assert_eq!(config.file.filename_pattern, "{prefix}log-{date}-{level}.json");
        assert_eq!(config.filters.exclude_sources, vec!["polling-service", "heartbeat"]);
    }

    #[test]
    fn test_effective_min_level_by_environment() {
        let mut config = LoggingConfig::default();
        assert_eq!(config.effective_min_level(), LogLevel::Debug);

        config.production = true;
        assert_eq!(config.effective_min_level(), LogLevel::Info);

        config.min_level = Some(LogLevel::Warn);
        assert_eq!(config.effective_min_level(), LogLevel::Warn);
    }

    #[test]
    fn test_redact_stacks_policy() {
        let mut config = LoggingConfig::default();
        assert!(!config.redact_stacks());
        config.production = true;
        assert!(config.redact_stacks());
        config.include_stacks_in_production = true;
        assert!(!config.redact_stacks());
    }

    #[test]
    fn test_config_empty_file() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_partial_sections() {
        let partial = r#"
[logging]
production = true
min_level = "warn"
remote_endpoints = ["http://localhost:3000/api/logs"]

[logging.emitters]
remote = true

[logging.file]
rotation_period = "hourly"
"#;

        let config = parse(partial).unwrap();

        assert!(config.logging.production);
        assert_eq!(config.logging.min_level, Some(LogLevel::Warn));
        assert!(config.logging.emitters.remote);
        // Unset fields keep defaults
        assert!(config.logging.emitters.console);
        assert_eq!(config.logging.file.rotation_period, RotationPeriod::Hourly);
        assert_eq!(config.logging.file.max_files, 5);
        assert_eq!(config.debug_console, DebugConsoleConfig::default());
    }

    #[test]
    fn test_shipped_default_matches_builtin() {
        let mut config = parse(include_str!("../config/default.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.remote_endpoints.len(), 1);
        config.logging.remote_endpoints.clear();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(parse("[logging]\nmin_level = \"verbose\"").is_err());
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let mut config = Config::default();
        config.logging.min_level = Some(LogLevel::Error);
        config.logging.remote_endpoints = vec!["https://logs.example.com".into()];
        config.runtime.user_agent = Some("Mozilla/5.0 Firefox/121.0".into());

        let text = to_toml(&config).unwrap();
        assert_eq!(parse(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_zero_caps_and_bad_urls() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.logging.max_stored_logs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.remote_endpoints = vec!["ftp://nope".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_falls_back_on_parse_error() {
        let dir = crate::storage::unique_temp_dir("config");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[logging\nbroken").unwrap();

        assert_eq!(load_from(&path), Config::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_then_load() {
        let dir = crate::storage::unique_temp_dir("config-save");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.debug_console.force = true;
        save_to(&config, &path).unwrap();

        assert!(load_from(&path).debug_console.force);
        let _ = fs::remove_dir_all(&dir);
    }
}
