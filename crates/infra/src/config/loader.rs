//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ROOMLY_API_BASE_URL`: Booking service base URL (required for env load)
//! - `ROOMLY_API_TOKEN`: Bearer token (optional)
//! - `ROOMLY_API_TIMEOUT`: Request timeout in seconds (optional)
//! - `ROOMLY_RETRY_MAX_ATTEMPTS`: Maximum retry attempts (optional)
//! - `ROOMLY_RETRY_BACKOFF_MS`: Linear backoff unit in ms (optional)
//!
//! The slot table cannot be expressed through the environment; env-based
//! loads use the built-in defaults. Deployments with custom slots use a
//! config file.
//!
//! ## File Locations
//! The loader probes `config.toml`/`config.json` and
//! `roomly.toml`/`roomly.json` in the working directory, then the parent
//! directory.

use std::path::PathBuf;

use roomly_domain::config::ConfigError;
use roomly_domain::Config;

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns [`ConfigError`] if configuration cannot be loaded from either
/// source or fails validation.
pub fn load() -> Result<Config, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `ROOMLY_API_BASE_URL` must be present; everything else falls back to
/// defaults. See module documentation for the complete list.
///
/// # Errors
/// Returns [`ConfigError::Load`] when the base URL is missing or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();

    config.api.base_url = std::env::var("ROOMLY_API_BASE_URL")
        .map_err(|_| ConfigError::Load("ROOMLY_API_BASE_URL not set".to_string()))?;
    config.api.token = std::env::var("ROOMLY_API_TOKEN").ok();

    if let Ok(timeout) = std::env::var("ROOMLY_API_TIMEOUT") {
        config.api.timeout_seconds = parse_u64("ROOMLY_API_TIMEOUT", &timeout)?;
    }
    if let Ok(attempts) = std::env::var("ROOMLY_RETRY_MAX_ATTEMPTS") {
        config.retry.max_attempts = parse_u64("ROOMLY_RETRY_MAX_ATTEMPTS", &attempts)? as u32;
    }
    if let Ok(backoff) = std::env::var("ROOMLY_RETRY_BACKOFF_MS") {
        config.retry.backoff_unit_ms = parse_u64("ROOMLY_RETRY_BACKOFF_MS", &backoff)?;
    }

    config.slots.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the default locations. Format is detected by
/// file extension (`.toml` or `.json`).
///
/// # Errors
/// Returns [`ConfigError`] when no file is found, the format is invalid, or
/// the slot table fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Load(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths()
            .ok_or_else(|| ConfigError::Load("No config file found".to_string()))?,
    };

    let content = std::fs::read_to_string(&config_path)
        .map_err(|e| ConfigError::Load(format!("Failed to read {}: {e}", config_path.display())))?;

    let extension = config_path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse(&content, extension)?;

    tracing::info!(path = %config_path.display(), "Configuration loaded from file");
    Ok(config)
}

/// Parse configuration text in the given format (`"toml"` or `"json"`).
pub fn parse(content: &str, format: &str) -> Result<Config, ConfigError> {
    let config: Config = match format {
        "toml" => toml::from_str(content)
            .map_err(|e| ConfigError::Load(format!("Invalid TOML config: {e}")))?,
        "json" => serde_json::from_str(content)
            .map_err(|e| ConfigError::Load(format!("Invalid JSON config: {e}")))?,
        other => {
            return Err(ConfigError::Load(format!("Unsupported config format: {other:?}")));
        }
    };

    config.slots.validate()?;
    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.toml", "config.json", "roomly.toml", "roomly.json"];

    for dir in ["./", "../"] {
        for name in NAMES {
            let candidate = PathBuf::from(dir).join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

fn parse_u64(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::Load(format!("Invalid {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Environment variables and the working directory are process-global;
    // tests that touch them take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_roomly_env() {
        for name in [
            "ROOMLY_API_BASE_URL",
            "ROOMLY_API_TOKEN",
            "ROOMLY_API_TIMEOUT",
            "ROOMLY_RETRY_MAX_ATTEMPTS",
            "ROOMLY_RETRY_BACKOFF_MS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn parses_toml_with_custom_slots() {
        let content = r#"
            [api]
            base_url = "https://rooms.example.com"
            timeout_seconds = 5

            [retry]
            max_attempts = 5
            backoff_unit_ms = 250

            [[slots]]
            id = "early"
            label = "Early"
            start = "07:00:00"
            end = "09:00:00"

            [[slots]]
            id = "late"
            label = "Late"
            start = "18:00:00"
            end = "21:00:00"
        "#;

        let config = parse(content, "toml").expect("valid config");
        assert_eq!(config.api.base_url, "https://rooms.example.com");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.slots.slots().len(), 2);
        assert_eq!(config.slots.slots()[0].id.as_str(), "early");
    }

    #[test]
    fn parses_json_with_defaults_filled_in() {
        let content = r#"{"api": {"base_url": "http://localhost:9999"}}"#;
        let config = parse(content, "json").expect("valid config");
        assert_eq!(config.api.base_url, "http://localhost:9999");
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.slots.contains(&roomly_domain::SlotId::new("morning")));
    }

    #[test]
    fn rejects_invalid_slot_table() {
        let content = r#"
            [[slots]]
            id = "broken"
            label = "Broken"
            start = "12:00:00"
            end = "09:00:00"
        "#;
        assert!(parse(content, "toml").is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(parse("whatever", "yaml").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/roomly.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn env_load_requires_base_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_roomly_env();
        assert!(load_from_env().is_err());
    }

    #[test]
    fn env_takes_precedence_over_config_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_roomly_env();

        let dir = std::env::temp_dir().join(format!("roomly-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        std::fs::write(
            dir.join("config.toml"),
            "[api]\nbase_url = \"https://file.example.com\"\n",
        )
        .expect("write config");

        let original_cwd = std::env::current_dir().expect("cwd");
        std::env::set_current_dir(&dir).expect("chdir");

        std::env::set_var("ROOMLY_API_BASE_URL", "https://env.example.com");
        std::env::set_var("ROOMLY_API_TOKEN", "env-token");
        std::env::set_var("ROOMLY_API_TIMEOUT", "7");
        std::env::set_var("ROOMLY_RETRY_MAX_ATTEMPTS", "4");
        std::env::set_var("ROOMLY_RETRY_BACKOFF_MS", "500");

        let from_env = load().expect("env load");
        assert_eq!(from_env.api.base_url, "https://env.example.com");
        assert_eq!(from_env.api.token.as_deref(), Some("env-token"));
        assert_eq!(from_env.api.timeout_seconds, 7);
        assert_eq!(from_env.retry.max_attempts, 4);
        assert_eq!(from_env.retry.backoff_unit_ms, 500);
        // Slots cannot come from the environment; defaults apply.
        assert!(from_env.slots.contains(&roomly_domain::SlotId::new("morning")));

        // Without the required variable the loader falls back to the probed file.
        std::env::remove_var("ROOMLY_API_BASE_URL");
        let from_file = load().expect("file load");
        assert_eq!(from_file.api.base_url, "https://file.example.com");

        std::env::set_current_dir(original_cwd).expect("restore cwd");
        clear_roomly_env();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
