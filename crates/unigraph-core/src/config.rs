//! Configuration management for unigraph.
//!
//! Configuration is loaded from (in priority order):
//! 1. `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`
//! 2. Environment variables (`UNIGRAPH__` prefix, `__` separator)
//! 3. Config file (`unigraph.toml` or the given prefix)
//! 4. Defaults

use serde::Deserialize;

use crate::error::CoreError;

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,
}

/// Connection settings for the backing graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Target database; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

/// Load settings from `file_prefix` (optional) and the environment.
pub fn load(file_prefix: &str) -> Result<Settings, CoreError> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("UNIGRAPH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("neo4j.uri", std::env::var("NEO4J_URI").ok())?
        .set_override_option("neo4j.user", std::env::var("NEO4J_USERNAME").ok())?
        .set_override_option("neo4j.password", std::env::var("NEO4J_PASSWORD").ok())?
        .set_override_option("neo4j.database", std::env::var("NEO4J_DATABASE").ok())?
        .build()?;

    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.neo4j.max_connections, 16);
        assert_eq!(settings.neo4j.fetch_size, 256);
        assert!(settings.neo4j.database.is_none());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"neo4j": {"uri": "neo4j+s://db.example:7687"}}"#).unwrap();
        assert_eq!(settings.neo4j.uri, "neo4j+s://db.example:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.neo4j.fetch_size, 256);
    }
}
