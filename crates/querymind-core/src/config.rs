use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QuerymindError, Result};

/// Top-level configuration for the QueryMind application.
///
/// Loaded from `~/.querymind/config.toml` by default. Each section corresponds
/// to one external collaborator or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuerymindConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl QuerymindConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QuerymindConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| QuerymindError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Text-generation gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// REST endpoint base, without trailing slash.
    pub base_url: String,
    /// Model identifier passed to the generate endpoint.
    pub model: String,
    /// API key. Empty means "read from QUERYMIND_GATEWAY_KEY at startup".
    pub api_key: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Relational database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost/querymind".to_string(),
            max_connections: 10,
        }
    }
}

/// Vector retrieval service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Retrieval sidecar base URL.
    pub base_url: String,
    /// Collection to search.
    pub collection: String,
    /// Number of entity identifiers to retrieve per query.
    pub top_k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8100".to_string(),
            collection: "products".to_string(),
            top_k: 5,
        }
    }
}

/// Encyclopedia lookup settings, including the retry policy used by the
/// tool node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaConfig {
    /// Wikipedia-compatible API base URL.
    pub base_url: String,
    /// Timeout for the page-existence request, in seconds.
    pub page_timeout_secs: u64,
    /// Timeout for the summary request, in seconds.
    pub summary_timeout_secs: u64,
    /// Total lookup attempts before falling back to a glossary definition.
    pub max_attempts: u32,
    /// First backoff interval between attempts, in seconds. Doubles per retry.
    pub initial_backoff_secs: u64,
    /// Summaries are truncated to this many characters.
    pub summary_max_chars: usize,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            page_timeout_secs: 15,
            summary_timeout_secs: 10,
            max_attempts: 3,
            initial_backoff_secs: 2,
            summary_max_chars: 500,
        }
    }
}

/// Conversational memory backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Whether the memory backend is enabled. When false the pipeline runs
    /// with an empty context and exchanges are not persisted.
    pub enabled: bool,
    /// Memory backend base URL.
    pub base_url: String,
    /// API key for the memory backend.
    pub api_key: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:8200".to_string(),
            api_key: String::new(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the API server.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QuerymindConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.vector.top_k, 5);
        assert_eq!(config.encyclopedia.page_timeout_secs, 15);
        assert_eq!(config.encyclopedia.summary_timeout_secs, 10);
        assert_eq!(config.encyclopedia.max_attempts, 3);
        assert_eq!(config.encyclopedia.initial_backoff_secs, 2);
        assert_eq!(config.encyclopedia.summary_max_chars, 500);
        assert!(!config.memory.enabled);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = QuerymindConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: QuerymindConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.model, config.gateway.model);
        assert_eq!(parsed.database.max_connections, config.database.max_connections);
        assert_eq!(parsed.encyclopedia.max_attempts, config.encyclopedia.max_attempts);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [gateway]
            model = "gemini-pro"

            [server]
            port = 9000
        "#;
        let config: QuerymindConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.model, "gemini-pro");
        assert_eq!(config.server.port, 9000);
        // Unspecified sections keep their defaults.
        assert_eq!(config.vector.top_k, 5);
        assert_eq!(config.encyclopedia.summary_max_chars, 500);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: QuerymindConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, QuerymindConfig::default().server.port);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = QuerymindConfig::default();
        config.server.port = 8443;
        config.save(&path).unwrap();

        let loaded = QuerymindConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 8443);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = QuerymindConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = QuerymindConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.server.port, QuerymindConfig::default().server.port);
    }

    #[test]
    fn test_load_or_default_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();

        let config = QuerymindConfig::load_or_default(&path);
        assert_eq!(config.gateway.timeout_secs, 30);
    }
}
