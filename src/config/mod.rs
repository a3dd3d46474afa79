use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_PORT: u16 = 6767;
const DEFAULT_DB_CONNECTIONS: u32 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Base URL serving raw repository files as `<base>/<repo>/<branch>/<file>`.
    pub source_url: String,
    pub cluster_api_url: String,
    pub converter_url: Option<String>,
    pub default_branch: String,
    pub http_timeout_secs: u64,
    pub cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = crate::paths::data_dir()
            .map(|dir| format!("sqlite:{}", dir.join("solutions.db").display()))
            .unwrap_or_else(|_| "sqlite:solutions.db".to_string());
        Self {
            database_url,
            db_max_connections: DEFAULT_DB_CONNECTIONS,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            source_url: "https://raw.githubusercontent.com".to_string(),
            cluster_api_url: "http://kube-api:1214".to_string(),
            converter_url: None,
            default_branch: "master".to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            cors: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_config) = Self::from_conf_file()? {
            config.apply_file(file_config);
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.normalize_database_url()?;
        config.validate()?;
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    fn from_conf_file() -> Result<Option<FileConfig>> {
        let path = crate::paths::conf_dir()?.join("config.json");
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file_config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(file_config))
    }

    fn apply_file(&mut self, file_config: FileConfig) {
        if let Some(database_url) = file_config.database_url {
            self.database_url = database_url;
        }
        if let Some(db_max_connections) = file_config.db_max_connections {
            self.db_max_connections = db_max_connections;
        }
        if let Some(host) = file_config.host {
            self.host = host;
        }
        if let Some(port) = file_config.port {
            self.port = port;
        }
        if let Some(source_url) = file_config.source_url {
            self.source_url = source_url;
        }
        if let Some(cluster_api_url) = file_config.cluster_api_url {
            self.cluster_api_url = cluster_api_url;
        }
        if file_config.converter_url.is_some() {
            self.converter_url = file_config.converter_url;
        }
        if let Some(default_branch) = file_config.default_branch {
            self.default_branch = default_branch;
        }
        if let Some(http_timeout_secs) = file_config.http_timeout_secs {
            self.http_timeout_secs = http_timeout_secs;
        }
        if let Some(cors) = file_config.cors {
            self.cors = cors;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(db_url) = var("DATABASE_URL") {
            self.database_url = db_url;
        }
        if let Some(max) = var("DB_MAX_CONNECTIONS") {
            self.db_max_connections = max.parse().unwrap_or(DEFAULT_DB_CONNECTIONS);
        }
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = port.parse().unwrap_or(DEFAULT_PORT);
        }
        if let Some(source_url) = var("SOURCE_URL") {
            self.source_url = source_url;
        }
        if let Some(cluster_api_url) = var("KUBE_API_URL") {
            self.cluster_api_url = cluster_api_url;
        }
        if let Some(converter_url) = var("CONVERTER_URL") {
            let converter_url = converter_url.trim().to_string();
            self.converter_url = (!converter_url.is_empty()).then_some(converter_url);
        }
        if let Some(branch) = var("DEFAULT_BRANCH") {
            self.default_branch = branch;
        }
        if let Some(timeout) = var("HTTP_TIMEOUT") {
            self.http_timeout_secs = timeout.parse().unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        }
        if let Some(cors) = var("CORS") {
            self.cors = matches!(cors.trim(), "1" | "true" | "yes");
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_branch.trim().is_empty() {
            anyhow::bail!("default_branch cannot be empty");
        }
        if self.db_max_connections == 0 {
            anyhow::bail!("db_max_connections must be at least 1");
        }
        reqwest::Url::parse(&self.source_url)
            .with_context(|| format!("Invalid source_url {}", self.source_url))?;
        reqwest::Url::parse(&self.cluster_api_url)
            .with_context(|| format!("Invalid cluster_api_url {}", self.cluster_api_url))?;
        if let Some(converter_url) = &self.converter_url {
            reqwest::Url::parse(converter_url)
                .with_context(|| format!("Invalid converter_url {}", converter_url))?;
        }
        Ok(())
    }

    fn normalize_database_url(&mut self) -> Result<()> {
        let Some(path_str) = self.database_url.strip_prefix("sqlite:") else {
            return Ok(());
        };
        if path_str.starts_with(":memory:") {
            return Ok(());
        }

        let path = Path::new(path_str);
        if path.is_absolute() {
            return Ok(());
        }

        if path
            .components()
            .any(|component| matches!(component, std::path::Component::ParentDir))
        {
            anyhow::bail!("SQLite database path cannot contain '..'");
        }

        let root = crate::paths::install_root()?;
        self.database_url = format!("sqlite:{}", root.join(path).display());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    database_url: Option<String>,
    db_max_connections: Option<u32>,
    host: Option<String>,
    port: Option<u16>,
    source_url: Option<String>,
    cluster_api_url: Option<String>,
    converter_url: Option<String>,
    default_branch: Option<String>,
    http_timeout_secs: Option<u64>,
    cors: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn env_overrides_defaults() {
        let config = apply(&[
            ("PORT", "8080"),
            ("KUBE_API_URL", "http://localhost:1214"),
            ("CONVERTER_URL", "http://converter:6666"),
            ("DEFAULT_BRANCH", "main"),
            ("CORS", "true"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cluster_api_url, "http://localhost:1214");
        assert_eq!(config.converter_url.as_deref(), Some("http://converter:6666"));
        assert_eq!(config.default_branch, "main");
        assert!(config.cors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = apply(&[("PORT", "nope"), ("HTTP_TIMEOUT", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.http_timeout(), Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn blank_converter_url_disables_conversion() {
        let config = apply(&[("CONVERTER_URL", "  ")]);
        assert!(config.converter_url.is_none());
    }

    #[test]
    fn rejects_parent_dir_in_sqlite_path() {
        let mut config = Config {
            database_url: "sqlite:../escape.db".to_string(),
            ..Config::default()
        };
        assert!(config.normalize_database_url().is_err());
    }

    #[test]
    fn keeps_in_memory_database_url() {
        let mut config = Config {
            database_url: "sqlite::memory:".to_string(),
            ..Config::default()
        };
        config.normalize_database_url().unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
    }
}
