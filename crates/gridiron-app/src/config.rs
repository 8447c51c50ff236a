// Configuration loading and parsing (config/gridiron.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "gridiron.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// gridiron.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    #[serde(default)]
    pub ratings: RatingsConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// League used by `weekly-update` and `add-team` when none is given.
    pub default_league: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingsConfig {
    pub min_weeks_completed: u32,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            min_weeks_completed: gridiron_core::weekly::DEFAULT_MIN_WEEKS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/gridiron.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config: Config =
        toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;

    validate(&config)?;

    Ok(config)
}

/// Create `config/gridiron.toml` from `defaults/gridiron.toml` on first run.
///
/// Returns the path written, or `None` when a config file already exists. An
/// existing config is never touched.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {} in config/ or defaults/ under {}",
                CONFIG_FILE,
                base_dir.display()
            ),
        });
    }

    let copy = || -> std::io::Result<()> {
        std::fs::create_dir_all(base_dir.join("config"))?;
        std::fs::copy(&source, &target)?;
        Ok(())
    };
    copy().map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;

    Ok(Some(target))
}

/// Copy the shipped default on first run, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.default_league.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.default_league".into(),
            message: "must not be empty".into(),
        });
    }

    if config.ratings.min_weeks_completed == 0 {
        return Err(ConfigError::ValidationError {
            field: "ratings.min_weeks_completed".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"
[league]
default_league = "NFL"

[ratings]
min_weeks_completed = 4

[database]
path = "gridiron.db"

[logging]
directory = "var/log"
"#;

    /// Helper: fresh scratch directory with `config/gridiron.toml` holding `text`.
    fn scratch_with_config(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    /// Helper: the crate's own `defaults/` directory.
    fn crate_defaults() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("defaults")
    }

    #[test]
    fn load_valid_config() {
        let tmp = scratch_with_config("gridiron_config_valid", VALID);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.league.default_league, "NFL");
        assert_eq!(config.ratings.min_weeks_completed, 4);
        assert_eq!(config.database.path, "gridiron.db");
        assert_eq!(config.logging.directory, "var/log");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shipped_defaults_are_valid() {
        let tmp = std::env::temp_dir().join("gridiron_config_shipped");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(
            crate_defaults().join(CONFIG_FILE),
            tmp.join("config").join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(
            config.ratings.min_weeks_completed,
            gridiron_core::weekly::DEFAULT_MIN_WEEKS
        );
        assert_eq!(config.logging.directory, "logs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_take_defaults() {
        let tmp = scratch_with_config(
            "gridiron_config_minimal",
            "[league]\ndefault_league = \"CFL\"\n\n[database]\npath = \"cfl.db\"\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.ratings.min_weeks_completed, 3);
        assert_eq!(config.logging.directory, "logs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_league() {
        let tmp = scratch_with_config(
            "gridiron_config_empty_league",
            &VALID.replace("\"NFL\"", "\"  \""),
        );
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "league.default_league");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_min_weeks() {
        let tmp = scratch_with_config(
            "gridiron_config_zero_weeks",
            &VALID.replace("min_weeks_completed = 4", "min_weeks_completed = 0"),
        );
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "ratings.min_weeks_completed");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_database_path() {
        let tmp = scratch_with_config(
            "gridiron_config_empty_db",
            &VALID.replace("\"gridiron.db\"", "\"\""),
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "database.path"),
            "got: {err}"
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("gridiron_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }), "got: {err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_with_config("gridiron_config_invalid", "[league\ndefault_league =");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }), "got: {err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    // -- ensure_config_file --

    #[test]
    fn first_run_copies_default() {
        let tmp = std::env::temp_dir().join("gridiron_config_first_run");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), VALID).unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert_eq!(copied, Some(tmp.join("config").join(CONFIG_FILE)));
        assert!(load_config(&tmp).is_ok());
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_is_kept() {
        let tmp = scratch_with_config("gridiron_config_kept", VALID);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "overwritten").unwrap();

        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let kept = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(kept, VALID);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_needs_no_defaults() {
        let tmp = scratch_with_config("gridiron_config_no_defaults", VALID);
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_config_and_default_is_an_error() {
        let tmp = std::env::temp_dir().join("gridiron_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_file(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }), "got: {err}");
        let _ = fs::remove_dir_all(&tmp);
    }
}
