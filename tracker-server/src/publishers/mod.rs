//! [`MessagePublisher`] implementations and backend selection.

#[cfg(feature = "kafka")]
mod kafka;
mod log;

#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;
pub use log::LogPublisher;

use crate::config::runtime::{MessagingBackend, MessagingConfig};
use std::sync::Arc;
use tracker_core::clients::MessagePublisher;

/// Build the publisher selected by `messaging.backend`.
pub fn build_publisher(config: &MessagingConfig) -> anyhow::Result<Arc<dyn MessagePublisher>> {
    match config.backend {
        MessagingBackend::Log => {
            tracing::info!(topic = %config.topic, "Publishing score updates to the log");
            Ok(Arc::new(LogPublisher::new(&config.topic)))
        }
        #[cfg(feature = "kafka")]
        MessagingBackend::Kafka => Ok(Arc::new(KafkaPublisher::new(config)?)),
        #[cfg(not(feature = "kafka"))]
        MessagingBackend::Kafka => Err(anyhow::anyhow!(
            "messaging backend `kafka` is not compiled in; rebuild with `--features kafka`"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_backend_selected() {
        let config = MessagingConfig {
            backend: MessagingBackend::Log,
            topic: "scores".to_string(),
            bootstrap_servers: "localhost:9092".to_string(),
            acks: "all".to_string(),
            partitions: 3,
            replicas: 1,
            ack_timeout: Duration::from_secs(10),
        };
        let publisher = build_publisher(&config).unwrap();
        assert_eq!(publisher.topic(), "scores");
    }
}
