//! Connection settings
//!
//! Defaults point at a local server. Settings can be read from `TOGM_NEO4J_*`
//! environment variables or from a YAML / JSON file.

use crate::error::{Neo4jError, Neo4jResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Neo4j connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// Bolt URI
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name (None = server default)
    pub database: Option<String>,
    /// Rows fetched per round-trip when streaming results
    pub fetch_size: usize,
    /// Maximum pooled connections
    pub max_connections: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: None,
            fetch_size: 200,
            max_connections: 16,
        }
    }
}

impl Neo4jConfig {
    pub const ENV_URI: &'static str = "TOGM_NEO4J_URI";
    pub const ENV_USER: &'static str = "TOGM_NEO4J_USER";
    pub const ENV_PASSWORD: &'static str = "TOGM_NEO4J_PASSWORD";
    pub const ENV_DATABASE: &'static str = "TOGM_NEO4J_DATABASE";
    pub const ENV_FETCH_SIZE: &'static str = "TOGM_NEO4J_FETCH_SIZE";
    pub const ENV_MAX_CONNECTIONS: &'static str = "TOGM_NEO4J_MAX_CONNECTIONS";

    /// Defaults overridden by whichever `TOGM_NEO4J_*` variables are set
    pub fn from_env() -> Neo4jResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Neo4jResult<Self> {
        let mut config = Self::default();
        if let Some(uri) = lookup(Self::ENV_URI) {
            config.uri = uri;
        }
        if let Some(user) = lookup(Self::ENV_USER) {
            config.user = user;
        }
        if let Some(password) = lookup(Self::ENV_PASSWORD) {
            config.password = password;
        }
        if let Some(database) = lookup(Self::ENV_DATABASE) {
            config.database = Some(database).filter(|d| !d.is_empty());
        }
        if let Some(fetch_size) = lookup(Self::ENV_FETCH_SIZE) {
            config.fetch_size = parse_count(Self::ENV_FETCH_SIZE, &fetch_size)?;
        }
        if let Some(max_connections) = lookup(Self::ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_count(Self::ENV_MAX_CONNECTIONS, &max_connections)?;
        }
        Ok(config)
    }

    /// Load from a YAML (or JSON, which YAML accepts) file
    pub fn from_path(path: impl AsRef<Path>) -> Neo4jResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        serde_yaml::from_str(&text)
            .map_err(|e| Neo4jError::Config(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub(crate) fn to_bolt_config(&self) -> Neo4jResult<neo4rs::Config> {
        let mut builder = neo4rs::ConfigBuilder::default()
            .uri(self.uri.as_str())
            .user(self.user.as_str())
            .password(self.password.as_str())
            .fetch_size(self.fetch_size)
            .max_connections(self.max_connections);
        if let Some(database) = &self.database {
            builder = builder.db(database.as_str());
        }
        Ok(builder.build()?)
    }
}

fn parse_count(key: &str, value: &str) -> Neo4jResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Neo4jError::Config(format!("{} must be a positive integer, got '{}'", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Neo4jConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.database, None);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (Neo4jConfig::ENV_URI, "neo4j://db:7687"),
            (Neo4jConfig::ENV_DATABASE, "movies"),
            (Neo4jConfig::ENV_FETCH_SIZE, "500"),
        ]
        .into_iter()
        .collect();
        let config = Neo4jConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.uri, "neo4j://db:7687");
        assert_eq!(config.database.as_deref(), Some("movies"));
        assert_eq!(config.fetch_size, 500);
        assert_eq!(config.user, "neo4j");

        let err = Neo4jConfig::from_lookup(|key| {
            (key == Neo4jConfig::ENV_MAX_CONNECTIONS).then(|| "zero".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Neo4jError::Config(_)));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "uri: bolt://graph.internal:7687\npassword: secret\nmax_connections: 4").unwrap();
        let config = Neo4jConfig::from_path(file.path()).unwrap();
        assert_eq!(config.uri, "bolt://graph.internal:7687");
        assert_eq!(config.password, "secret");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.fetch_size, 200);
    }
}
