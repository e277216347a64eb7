use std::time::Duration;
use rumqttc::{Event, EventLoop, Incoming, Publish};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};
use crate::services::mqtt::mqtt_client::MqttClient;

/// Pause between reconnection attempts
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// # MqttEventPump
///
/// Drives the broker connection for the rest of the process lifetime once the startup handshake is done.
///
/// Control-topic payloads are forwarded, unparsed, to the command handler through a bounded channel.
/// The pump never waits on the door machinery: if the channel is full the payload is dropped.
/// Connection errors are retried indefinitely; each re-established session re-subscribes and re-announces presence.
pub struct MqttEventPump {
    client: MqttClient,
    event_loop: EventLoop,
    commands: mpsc::Sender<Vec<u8>>,
}

impl MqttEventPump {
    pub fn new(client: MqttClient, event_loop: EventLoop, commands: mpsc::Sender<Vec<u8>>) -> Self {
        Self { client, event_loop, commands }
    }

    /// Polls the event loop forever.
    pub async fn run(mut self) {
        info!("Starting MQTT event pump");
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    forward_control(self.client.control_topic(), &self.commands, publish);
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("Reconnected to broker, restoring session");
                    if let Err(e) = self.client.restore_session() {
                        error!("Failed to restore MQTT session: {}", e);
                    }
                }
                Ok(event) => debug!("MQTT event: {:?}", event),
                Err(e) => {
                    warn!("MQTT connection error: {}; retrying in {:?}", e, RECONNECT_DELAY);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

/// Hands a control-topic payload to the command queue without waiting.
///
/// Messages on any other topic are ignored. When the queue is full or the handler has stopped the
/// payload is dropped.
///
/// # Returns
///
/// `true` if the payload was queued.
pub fn forward_control(control_topic: &str, commands: &mpsc::Sender<Vec<u8>>, publish: Publish) -> bool {
    if publish.topic != control_topic {
        debug!("Ignoring message on {}", publish.topic);
        return false;
    }

    match commands.try_send(publish.payload.to_vec()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Command queue full, dropping control message");
            false
        }
        Err(TrySendError::Closed(_)) => {
            error!("Command handler stopped, dropping control message");
            false
        }
    }
}
