//! Configuration module for tracker-server.
//!
//! Handles loading configuration from the TOML file and applying CLI
//! overrides, then validating it into runtime settings.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    ExternalApiConfig, MessagingBackend, MessagingConfig, PollingConfig, ServerConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracker_core::processors::SchedulerConfig;
use tracker_core::retry::RetryPolicy;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid external_api.url: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub polling: PollingConfig,
    pub external_api: ExternalApiConfig,
    pub messaging: MessagingConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate the result.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let file_config: FileConfig = toml::from_str(&config_content)?;
        self.build(file_config)
    }

    fn build(&self, mut file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        let url = Url::parse(&file_config.external_api.url)?;
        Ok(build_loaded_config(file_config, url))
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.polling.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if config.polling.pool_size == 0 {
            return Err(ConfigError::ValidationError(
                "polling.pool_size must be greater than zero".to_string(),
            ));
        }

        let timeouts = [
            ("external_api.timeout_ms", config.external_api.timeout_ms),
            ("messaging.ack_timeout_ms", config.messaging.ack_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must be greater than zero"
                )));
            }
        }

        let retries = [
            (
                "external_api",
                config.external_api.retry_attempts,
                config.external_api.retry_multiplier,
            ),
            (
                "messaging",
                config.messaging.retry_attempts,
                config.messaging.retry_multiplier,
            ),
        ];
        for (section, attempts, multiplier) in retries {
            if attempts == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{section}.retry_attempts must be at least 1"
                )));
            }
            if multiplier.is_nan() || multiplier < 1.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{section}.retry_multiplier must be at least 1.0, got {multiplier}"
                )));
            }
        }

        if config.messaging.backend == MessagingBackend::Kafka && !cfg!(feature = "kafka") {
            return Err(ConfigError::ValidationError(
                "messaging.backend = \"kafka\" needs a build with the `kafka` feature".to_string(),
            ));
        }

        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig, url: Url) -> LoadedConfig {
    let polling = file_config.polling;
    let api = file_config.external_api;
    let messaging = file_config.messaging;
    let ack_timeout = Duration::from_millis(messaging.ack_timeout_ms);

    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
            mock_api: file_config.server.mock_api,
        },
        polling: PollingConfig {
            scheduler: SchedulerConfig {
                period: Duration::from_millis(polling.interval_ms),
                initial_delay: Duration::from_millis(polling.initial_delay_ms),
                pool_size: polling.pool_size,
            },
            fetch_retry: RetryPolicy {
                max_attempts: api.retry_attempts,
                base_delay: Duration::from_millis(api.retry_base_delay_ms),
                multiplier: api.retry_multiplier,
                max_delay: Duration::from_millis(api.retry_max_delay_ms),
                attempt_timeout: Some(Duration::from_millis(api.timeout_ms)),
            },
            publish_retry: RetryPolicy {
                max_attempts: messaging.retry_attempts,
                base_delay: Duration::from_millis(messaging.retry_base_delay_ms),
                multiplier: messaging.retry_multiplier,
                max_delay: Duration::from_millis(messaging.retry_max_delay_ms),
                attempt_timeout: Some(ack_timeout),
            },
            shutdown_grace: Duration::from_secs(polling.shutdown_grace_secs),
        },
        external_api: ExternalApiConfig {
            url,
            timeout: Duration::from_millis(api.timeout_ms),
        },
        messaging: MessagingConfig {
            backend: messaging.backend,
            topic: messaging.topic,
            bootstrap_servers: messaging.bootstrap_servers,
            acks: messaging.acks,
            partitions: messaging.partitions,
            replicas: messaging.replicas,
            ack_timeout,
        },
    }
}
