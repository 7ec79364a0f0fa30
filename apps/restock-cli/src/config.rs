//! # CLI Configuration
//!
//! Where the database lives, how the pipeline is tuned and how loud the logs
//! are.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line flags (highest priority)                              │
//! │     --db ./market.db  --log-level debug                                │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     RESTOCK_DB_PATH, RESTOCK_WINDOW, RESTOCK_UPLIFT_BPS,               │
//! │     RESTOCK_MAX_ATTEMPTS, RESTOCK_ITEMS, RESTOCK_LOG,                  │
//! │     RESTOCK_CONNECT_TIMEOUT_SECS                                       │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config PATH, or the platform config dir:                         │
//! │     ~/.config/restock/restock.toml (Linux)                             │
//! │     ~/Library/Application Support/com.restock.restock/restock.toml     │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All four layers are merged first and validated once, so a flag can repair
//! a bad value from the file.
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/restock/restock.db"
//! max_connections = 2
//! connect_timeout_secs = 30
//!
//! [pipeline]
//! items = ["bacon", "chicken", "egg", "ham", "tuna", "turkey"]
//! window = 5
//! uplift_bps = 1000
//! max_attempts = 10
//!
//! [logging]
//! level = "info"
//! ```

use restock_core::{ConfigError, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Config file name inside the platform config dir.
pub const CONFIG_FILE_NAME: &str = "restock.toml";

/// Why configuration could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first use.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pool connection before giving up.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "restock", "restock")
        .map(|dirs| dirs.data_dir().join("restock.db"))
        .unwrap_or_else(|| PathBuf::from("restock.db"))
}

fn default_max_connections() -> u32 {
    2
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. `info` or `restock_core=debug`.
    /// `RUST_LOG` wins over this when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
        }
    }
}

/// Values given as command line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

// =============================================================================
// Restock Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl RestockConfig {
    /// Loads and validates the merged configuration.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`path`, else the platform default if it exists)
    /// 3. Environment variables
    /// 4. Command line flags
    ///
    /// An explicit `path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(path: Option<&Path>, cli: CliOverrides) -> Result<Self, LoadError> {
        Self::load_with(path, cli, |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: Option<&Path>, cli: CliOverrides, env: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(env)?;
        config.apply_cli_overrides(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Required {
                field: "database.path".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be at least 1",
            ));
        }

        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "database.connect_timeout_secs",
                "must be at least 1",
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::invalid("logging.level", e.to_string()));
        }

        self.pipeline.validate()
    }

    fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(path) = cli.db_path {
            self.database.path = path;
        }
        if let Some(level) = cli.log_level {
            self.logging.level = level;
        }
    }

    /// Applies `RESTOCK_*` overrides from a key lookup. Unparseable numbers
    /// are errors.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("RESTOCK_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("RESTOCK_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                parse_env("RESTOCK_CONNECT_TIMEOUT_SECS", &secs)?;
        }

        if let Some(window) = lookup("RESTOCK_WINDOW") {
            self.pipeline.window = parse_env("RESTOCK_WINDOW", &window)?;
        }

        if let Some(bps) = lookup("RESTOCK_UPLIFT_BPS") {
            self.pipeline.uplift_bps = parse_env("RESTOCK_UPLIFT_BPS", &bps)?;
        }

        if let Some(attempts) = lookup("RESTOCK_MAX_ATTEMPTS") {
            self.pipeline.max_attempts = Some(parse_env("RESTOCK_MAX_ATTEMPTS", &attempts)?);
        }

        if let Some(items) = lookup("RESTOCK_ITEMS") {
            self.pipeline.items = items
                .split(',')
                .map(|item| item.trim().to_string())
                .collect();
        }

        if let Some(level) = lookup("RESTOCK_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "restock", "restock")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a valid number", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RestockConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.window, 5);
        assert_eq!(config.pipeline.uplift_bps, 1000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.connect_timeout_secs, 30);
        assert!(config.database.path.ends_with("restock.db"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RestockConfig = toml::from_str(
            r#"
            [pipeline]
            items = ["pies", "pasties"]
            window = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.item_count(), 2);
        assert_eq!(config.pipeline.window, 3);
        assert_eq!(config.pipeline.uplift_bps, 1000);
        assert_eq!(config.database.max_connections, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RestockConfig::default();
        config
            .apply_overrides(env(&[
                ("RESTOCK_DB_PATH", "/tmp/market.db"),
                ("RESTOCK_WINDOW", "3"),
                ("RESTOCK_UPLIFT_BPS", "2500"),
                ("RESTOCK_MAX_ATTEMPTS", "4"),
                ("RESTOCK_ITEMS", "pies, pasties ,rolls"),
                ("RESTOCK_LOG", "debug"),
                ("RESTOCK_CONNECT_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/market.db"));
        assert_eq!(config.pipeline.window, 3);
        assert_eq!(config.pipeline.uplift_bps, 2500);
        assert_eq!(config.pipeline.max_attempts, Some(4));
        assert_eq!(config.pipeline.items, vec!["pies", "pasties", "rolls"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.connect_timeout_secs, 5);
    }

    #[test]
    fn test_bad_env_number_is_an_error() {
        let mut config = RestockConfig::default();
        let err = config
            .apply_overrides(env(&[("RESTOCK_WINDOW", "five")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "RESTOCK_WINDOW"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = RestockConfig::default();

        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());

        config.database.path = PathBuf::from("restock.db");
        config.database.connect_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.database.connect_timeout_secs = 1;
        config.pipeline.window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = Path::new("/nonexistent/restock.toml");
        let err = RestockConfig::load(Some(path), CliOverrides::default()).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let file = format!("restock-{}-{}.toml", name, std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_flags_repair_file_before_validation() {
        let path = write_config("repair", "[database]\npath = \"\"\n");

        let err = RestockConfig::load_with(Some(&path), CliOverrides::default(), env(&[]))
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ConfigError::Required { .. })));

        let cli = CliOverrides {
            db_path: Some(PathBuf::from("/tmp/market.db")),
            log_level: None,
        };
        let config = RestockConfig::load_with(Some(&path), cli, env(&[])).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/market.db"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_flags_beat_env_and_file() {
        let path = write_config("precedence", "[logging]\nlevel = \"warn\"\n");

        let cli = CliOverrides {
            db_path: Some(PathBuf::from("flag.db")),
            log_level: Some("debug".to_string()),
        };
        let config = RestockConfig::load_with(
            Some(&path),
            cli,
            env(&[("RESTOCK_DB_PATH", "env.db"), ("RESTOCK_LOG", "error")]),
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("flag.db"));
        assert_eq!(config.logging.level, "debug");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_toml_serialization() {
        let config = RestockConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("[logging]"));
    }
}
