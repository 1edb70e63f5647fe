//! Validated runtime configuration.
//!
//! Durations are converted from their `*_ms` file fields and retry settings
//! are assembled into core [`RetryPolicy`] values here, so the rest of the
//! binary never sees raw file numbers.

use std::net::SocketAddr;
use std::time::Duration;
use tracker_core::processors::SchedulerConfig;
use tracker_core::retry::RetryPolicy;
use url::Url;

pub use crate::config::file::MessagingBackend;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub mock_api: bool,
}

/// Everything the polling pipeline is built from.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub scheduler: SchedulerConfig,
    pub fetch_retry: RetryPolicy,
    pub publish_retry: RetryPolicy,
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct ExternalApiConfig {
    pub url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub backend: MessagingBackend,
    pub topic: String,
    pub bootstrap_servers: String,
    pub acks: String,
    /// Topic layout the deployment is expected to provide. Only reported at
    /// startup; topics are not created by this service.
    pub partitions: u32,
    pub replicas: u16,
    pub ack_timeout: Duration,
}
