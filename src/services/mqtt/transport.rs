use async_trait::async_trait;
use crate::errors::GarageResult;

/// # StatusTransport
///
/// The outbound half of the publish/subscribe connection, as seen by the door state machine.
///
/// Every message is sent "at most once". `retain` asks the broker to keep the payload as the topic's
/// last known value for future subscribers.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Hands `payload` to the transport for delivery on `topic`.
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> GarageResult<()>;
}
