use async_trait::async_trait;
use tracker_core::clients::{MessagePublisher, PublishError};

/// Publisher that writes every score update to the log instead of a broker.
///
/// Delivery always succeeds.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    topic: String,
}

impl LogPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl MessagePublisher for LogPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, key: &str, payload: &str) -> Result<(), PublishError> {
        tracing::info!(topic = %self.topic, key, payload, "Score update");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_always_succeeds() {
        let publisher = LogPublisher::new("sports-events");
        assert_eq!(publisher.topic(), "sports-events");
        publisher.publish("e1", r#"{"eventId":"e1"}"#).await.unwrap();
    }
}
