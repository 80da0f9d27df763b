//! File-based configuration loading

use super::SlotkitConfig;
use crate::error::{SlotError, SlotResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> SlotResult<SlotkitConfig> {
    if !path.exists() {
        return Ok(SlotkitConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        SlotError::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            SlotError::config(format!(
                "Failed to parse TOML config '{}': {}",
                path.display(),
                e
            ))
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            SlotError::config(format!(
                "Failed to parse YAML config '{}': {}",
                path.display(),
                e
            ))
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            SlotError::config(format!(
                "Failed to parse JSON config '{}': {}",
                path.display(),
                e
            ))
        })?,
    };

    Ok(config)
}

/// Serialize `config` in the format chosen by the extension of `path`
pub fn render_for_path(config: &SlotkitConfig, path: &Path) -> SlotResult<String> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::to_string_pretty(config)
            .map_err(|e| SlotError::config(format!("Failed to render TOML config: {}", e))),
        Some("yaml") | Some("yml") => serde_yaml::to_string(config)
            .map_err(|e| SlotError::config(format!("Failed to render YAML config: {}", e))),
        _ => Ok(serde_json::to_string_pretty(config)?),
    }
}

/// Write `config` to `path`, creating parent directories
pub fn save_to_file(config: &SlotkitConfig, path: &Path) -> SlotResult<()> {
    let rendered = render_for_path(config, path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ChunkFraming, Method};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("slotkit.json");
        let config_json = r#"{
            "retry": { "max_attempts": 3, "delay": "250ms" },
            "cache": { "stale_time": "30s", "max_entries": 128 },
            "stream": { "method": "GET", "framing": "lines", "field": "t" },
            "logging": { "level": "debug", "format": "json" }
        }"#;
        fs::write(&config_path, config_json).unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.cache.stale_time, Duration::from_secs(30));
        assert_eq!(config.cache.max_entries, Some(128));
        assert_eq!(config.stream.method, Method::Get);
        assert_eq!(config.stream.framing, ChunkFraming::Lines);
        assert_eq!(config.stream.field.as_deref(), Some("t"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("slotkit.toml");
        let config_toml = r#"
[retry]
max_attempts = 2
delay = "10ms"

[retry.backoff]
kind = "exponential"
multiplier = 2.0
max_delay = "1s"

[stream.headers]
authorization = "Bearer token"
"#;
        fs::write(&config_path, config_toml).unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.delay, Duration::from_millis(10));
        assert!(matches!(
            config.retry.backoff,
            crate::recovery::BackoffKind::Exponential { .. }
        ));
        assert_eq!(config.stream.headers["authorization"], "Bearer token");
        // Untouched sections keep their defaults
        assert_eq!(config.cache, crate::config::CacheConfig::default());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("slotkit.yaml");
        let yaml_content = r#"
cache:
  stale_time: 5s
logging:
  format: compact
"#;
        fs::write(&config_path, yaml_content).unwrap();

        let config = load_from_file(&config_path).unwrap();
        assert_eq!(config.cache.stale_time, Duration::from_secs(5));
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let config = load_from_file(Path::new("/nonexistent/slotkit.json")).unwrap();
        assert_eq!(config, SlotkitConfig::default());
    }

    #[test]
    fn test_load_from_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.json");
        fs::write(&config_path, "{ invalid json }").unwrap();

        let result = load_from_file(&config_path);
        assert!(matches!(result, Err(SlotError::Config(_))));
    }

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = SlotkitConfig::default();
        config.retry.max_attempts = 4;
        config.cache.max_entries = Some(16);

        for name in ["nested/slotkit.toml", "slotkit.yaml", "slotkit.json"] {
            let path = temp_dir.path().join(name);
            save_to_file(&config, &path).unwrap();
            assert_eq!(load_from_file(&path).unwrap(), config, "format of {}", name);
        }
    }
}
