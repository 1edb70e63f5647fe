//! Kafka-backed publisher.

use crate::config::runtime::MessagingConfig;
use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracker_core::clients::{MessagePublisher, PublishError};

/// Produces score updates to a Kafka topic, keyed by event id.
///
/// `publish` resolves once the broker has acknowledged the record at the
/// configured `acks` level, or fails after `ack_timeout`.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    ack_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(config: &MessagingConfig) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("acks", &config.acks)
            .set(
                "message.timeout.ms",
                config.ack_timeout.as_millis().to_string(),
            )
            .create()?;

        tracing::info!(
            brokers = %config.bootstrap_servers,
            topic = %config.topic,
            acks = %config.acks,
            partitions = config.partitions,
            replicas = config.replicas,
            "KafkaPublisher initialized"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            ack_timeout: config.ack_timeout,
        })
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, key: &str, payload: &str) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        match self.producer.send(record, self.ack_timeout).await {
            Ok((partition, offset)) => {
                tracing::debug!(key, partition, offset, "Score update acknowledged");
                Ok(())
            }
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => {
                Err(PublishError::AckTimeout(self.ack_timeout))
            }
            Err((e, _)) => Err(PublishError::Delivery(e.to_string())),
        }
    }
}
