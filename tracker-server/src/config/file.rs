//! TOML file configuration structures.
//!
//! These structs directly map to the `tracker-config.toml` file format.
//! Every section and every field is optional; missing values fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub external_api: ExternalApiConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Serve the mock score source under `/mock/events`.
    #[serde(default)]
    pub mock_api: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            mock_api: false,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Polling scheduler section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum number of ticks running at once.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// How long shutdown waits for in-flight ticks.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            pool_size: default_pool_size(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_interval_ms() -> u64 {
    10_000
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_pool_size() -> usize {
    10
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Score source section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalApiConfig {
    /// Endpoint queried with `?eventId=<id>`. Parsed when the file is loaded.
    #[serde(default = "default_external_api_url")]
    pub url: String,
    #[serde(default = "default_external_api_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_fetch_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
    #[serde(default = "default_fetch_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for ExternalApiConfig {
    fn default() -> Self {
        Self {
            url: default_external_api_url(),
            timeout_ms: default_external_api_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_fetch_base_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_delay_ms: default_fetch_max_delay_ms(),
        }
    }
}

fn default_external_api_url() -> String {
    "http://localhost:8080/mock/events/data".to_string()
}

fn default_external_api_timeout_ms() -> u64 {
    5000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_fetch_base_delay_ms() -> u64 {
    1000
}

fn default_retry_multiplier() -> f64 {
    2.0
}

fn default_fetch_max_delay_ms() -> u64 {
    5000
}

/// Where score updates are published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingBackend {
    /// Write every message to the log.
    #[default]
    Log,
    /// Produce to a Kafka topic. Requires the `kafka` feature.
    Kafka,
}

/// Messaging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub backend: MessagingBackend,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,
    /// Producer acknowledgement level passed to the broker client as-is.
    #[serde(default = "default_acks")]
    pub acks: String,
    #[serde(default = "default_partitions")]
    pub partitions: u32,
    #[serde(default = "default_replicas")]
    pub replicas: u16,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_publish_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
    #[serde(default = "default_publish_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            backend: MessagingBackend::default(),
            topic: default_topic(),
            bootstrap_servers: default_bootstrap_servers(),
            acks: default_acks(),
            partitions: default_partitions(),
            replicas: default_replicas(),
            ack_timeout_ms: default_ack_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_publish_base_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_delay_ms: default_publish_max_delay_ms(),
        }
    }
}

fn default_topic() -> String {
    "sports-events".to_string()
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_string()
}

fn default_acks() -> String {
    "all".to_string()
}

fn default_partitions() -> u32 {
    3
}

fn default_replicas() -> u16 {
    1
}

fn default_ack_timeout_ms() -> u64 {
    10_000
}

fn default_publish_base_delay_ms() -> u64 {
    2000
}

fn default_publish_max_delay_ms() -> u64 {
    10_000
}
