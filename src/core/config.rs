use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{FiasError, Result};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiasConfig {

    pub es_host: String,
    pub es_port: u16,
    pub es_index: String,
    pub es_username: Option<String>,
    pub es_password: Option<String>,
    pub es_scheme: String,
    /// Seconds.
    pub es_timeout: u64,
    pub es_max_retries: u32,


    pub search_limit: usize,
    pub max_search_limit: usize,
    pub worker_threads: usize,


    pub regression_batch_size: usize,
    pub regression_batch_timeout_secs: u64,
    pub regression_item_timeout_secs: u64,
    pub regression_batch_delay_ms: u64,

    pub log_level: String,
}

impl FiasConfig {

    pub fn new(host: &str, port: u16) -> Self {
        Self {
            es_host: host.to_string(),
            es_port: port,
            es_index: crate::DEFAULT_ES_INDEX.to_string(),
            es_username: None,
            es_password: None,
            es_scheme: "http".to_string(),
            es_timeout: 10,
            es_max_retries: 3,

            search_limit: crate::DEFAULT_SEARCH_LIMIT,
            max_search_limit: crate::MAX_SEARCH_LIMIT,
            worker_threads: 8,

            regression_batch_size: 10,
            regression_batch_timeout_secs: 30,
            regression_item_timeout_secs: 5,
            regression_batch_delay_ms: 500,

            log_level: "info".to_string(),
        }
    }


    pub fn from_env() -> Self {
        let mut config = Self::new(
            &std::env::var("ES_HOST").unwrap_or_else(|_| "localhost".to_string()),
            std::env::var("ES_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(crate::DEFAULT_ES_PORT),
        );

        if let Ok(index) = std::env::var("ES_INDEX") {
            config.es_index = index;
        }
        if let Ok(user) = std::env::var("ES_USERNAME") {
            config.es_username = Some(user);
        }
        if let Ok(password) = std::env::var("ES_PASSWORD") {
            config.es_password = Some(password);
        }
        if let Ok(scheme) = std::env::var("ES_SCHEME") {
            config.es_scheme = scheme;
        }
        if let Some(timeout) = std::env::var("ES_TIMEOUT").ok().and_then(|v| v.parse().ok()) {
            config.es_timeout = timeout;
        }
        if let Some(retries) = std::env::var("ES_MAX_RETRIES").ok().and_then(|v| v.parse().ok()) {
            config.es_max_retries = retries;
        }
        if let Some(limit) = std::env::var("FIAS_SEARCH_LIMIT").ok().and_then(|v| v.parse().ok()) {
            config.search_limit = limit;
        }
        if let Some(workers) = std::env::var("FIAS_WORKER_THREADS").ok().and_then(|v| v.parse().ok()) {
            config.worker_threads = workers;
        }
        if let Ok(level) = std::env::var("FIAS_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Layers an optional TOML file under `FIAS_`-prefixed environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("FIAS").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn validate(&self) -> Result<()> {
        if self.es_host.trim().is_empty() {
            return Err(FiasError::Config("es_host must not be empty".to_string()));
        }
        if self.es_index.trim().is_empty() {
            return Err(FiasError::Config("es_index must not be empty".to_string()));
        }
        if self.search_limit == 0 || self.search_limit > self.max_search_limit {
            return Err(FiasError::Config(format!(
                "search_limit must be in 1..={}, got {}",
                self.max_search_limit, self.search_limit
            )));
        }
        if self.worker_threads == 0 {
            return Err(FiasError::Config("worker_threads must be positive".to_string()));
        }
        if self.regression_batch_size == 0 {
            return Err(FiasError::Config("regression_batch_size must be positive".to_string()));
        }
        Ok(())
    }


    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&format!("{}://{}:{}", self.es_scheme, self.es_host, self.es_port))
            .map_err(|e| FiasError::Config(format!("invalid Elasticsearch address: {}", e)))
    }


    pub fn search_url(&self) -> Result<Url> {
        self.base_url()?
            .join(&format!("{}/_search", self.es_index))
            .map_err(|e| FiasError::Config(format!("invalid index name {}: {}", self.es_index, e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.es_timeout)
    }

    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.max_search_limit)
    }
}

impl Default for FiasConfig {
    fn default() -> Self {
        Self::new("localhost", crate::DEFAULT_ES_PORT)
    }
}
