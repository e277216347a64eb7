use std::time::Duration;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, Outgoing, QoS, SubscribeReasonCode};
use secrecy::ExposeSecret;
use tracing::{debug, info};
use crate::config::Settings;
use crate::errors::{GarageError, GarageResult};
use crate::models::{PRESENCE_OFFLINE, PRESENCE_ONLINE};
use crate::services::mqtt::transport::StatusTransport;

/// Deadline for each step of the startup handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for handing a runtime publish to the client
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);
/// Capacity of the client's outgoing request queue
const REQUEST_CAPACITY: usize = 32;
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// # MqttClient
///
/// A cloneable handle on the broker connection. The handle only queues requests; the paired `EventLoop`
/// performs the network I/O and must be driven, first by the startup handshake and afterwards by the
/// `MqttEventPump`.
///
/// ## Usage
///
/// ```rust,ignore
/// let (client, event_loop) = MqttClient::start(&settings).await?;
/// client.publish("garage/status", "C", true).await?;
/// ```
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    presence_topic: String,
    control_topic: String,
}

impl MqttClient {
    /// Builds the connection options: broker address, credentials, client id and the `GBP-OFFLINE` last will.
    pub fn options(settings: &Settings) -> GarageResult<MqttOptions> {
        let broker = settings.broker_address()?;
        let mut options = MqttOptions::new(settings.mqtt_client_id.clone(), broker.host, broker.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);

        if !settings.mqtt_username.is_empty() || settings.mqtt_password.is_some() {
            let password = settings.mqtt_password
                .as_ref()
                .map(|p| p.expose_secret().clone())
                .unwrap_or_default();
            options.set_credentials(settings.mqtt_username.clone(), password);
        }

        options.set_last_will(LastWill::new(
            settings.mqtt_topic_presence.clone(),
            PRESENCE_OFFLINE,
            QoS::AtMostOnce,
            false,
        ));

        Ok(options)
    }

    /// Creates the client handle and its event loop without touching the network.
    pub fn new(settings: &Settings) -> GarageResult<(Self, EventLoop)> {
        let (client, event_loop) = AsyncClient::new(Self::options(settings)?, REQUEST_CAPACITY);
        Ok((
            Self {
                client,
                presence_topic: settings.mqtt_topic_presence.clone(),
                control_topic: settings.mqtt_topic_control.clone(),
            },
            event_loop,
        ))
    }

    /// Connects, announces presence and subscribes to the control topic.
    ///
    /// Every step must succeed within `HANDSHAKE_TIMEOUT`; any failure is returned to the caller,
    /// which treats it as fatal.
    pub async fn start(settings: &Settings) -> GarageResult<(Self, EventLoop)> {
        let (client, mut event_loop) = Self::new(settings)?;

        client.connect(&mut event_loop).await
            .map_err(|e| GarageError::ConnectionError(format!("Unable to connect to '{}': {}", settings.mqtt_server, e)))?;
        info!("Connected to {}", settings.mqtt_server);

        client.announce_presence(&mut event_loop).await
            .map_err(|e| GarageError::TransportError(format!("Unable to publish presence to '{}': {}", settings.mqtt_server, e)))?;

        client.subscribe_control(&mut event_loop).await
            .map_err(|e| GarageError::SubscriptionRejected(format!("Unable to subscribe to control topic '{}': {}", client.control_topic, e)))?;
        info!("Subscribed to control topic {}", client.control_topic);

        Ok((client, event_loop))
    }

    /// Drives the event loop until the broker acknowledges the connection.
    pub async fn connect(&self, event_loop: &mut EventLoop) -> GarageResult<()> {
        drive_until(event_loop, "CONNACK", |event| {
            Ok(matches!(event, Event::Incoming(Incoming::ConnAck(_))))
        }).await
    }

    /// Publishes `GBP-ONLINE` on the presence topic and waits until it has left the client.
    pub async fn announce_presence(&self, event_loop: &mut EventLoop) -> GarageResult<()> {
        self.client.publish(self.presence_topic.clone(), QoS::AtMostOnce, false, PRESENCE_ONLINE).await?;
        drive_until(event_loop, "presence publish", |event| {
            Ok(matches!(event, Event::Outgoing(Outgoing::Publish(_))))
        }).await
    }

    /// Subscribes to the control topic and checks the broker's SUBACK.
    pub async fn subscribe_control(&self, event_loop: &mut EventLoop) -> GarageResult<()> {
        self.client.subscribe(self.control_topic.clone(), QoS::AtMostOnce).await?;
        drive_until(event_loop, "SUBACK", |event| match event {
            Event::Incoming(Incoming::SubAck(ack)) => {
                if ack.return_codes.iter().any(|code| matches!(code, SubscribeReasonCode::Failure)) {
                    Err(GarageError::SubscriptionRejected("broker returned failure".to_string()))
                } else {
                    Ok(true)
                }
            }
            _ => Ok(false),
        }).await
    }

    /// Re-issues the subscription and presence announcement after a reconnect.
    ///
    /// Uses the non-blocking request path because it is called from the task that drains the request queue.
    pub fn restore_session(&self) -> GarageResult<()> {
        self.client.try_subscribe(self.control_topic.clone(), QoS::AtMostOnce)?;
        self.client.try_publish(self.presence_topic.clone(), QoS::AtMostOnce, false, PRESENCE_ONLINE)?;
        Ok(())
    }

    pub fn control_topic(&self) -> &str {
        &self.control_topic
    }
}

#[async_trait]
impl StatusTransport for MqttClient {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> GarageResult<()> {
        tokio::time::timeout(
            PUBLISH_TIMEOUT,
            self.client.publish(topic, QoS::AtMostOnce, retain, payload.as_bytes().to_vec()),
        )
            .await
            .map_err(|_| GarageError::Timeout(format!("publish to {} timed out", topic)))?
            .map_err(GarageError::from)
    }
}

/// Polls `event_loop` until `done` accepts an event, an error occurs or `HANDSHAKE_TIMEOUT` elapses.
async fn drive_until<F>(event_loop: &mut EventLoop, what: &str, mut done: F) -> GarageResult<()>
    where
        F: FnMut(&Event) -> GarageResult<bool>,
{
    let wait = async {
        loop {
            let event = event_loop.poll().await?;
            debug!("Handshake event while waiting for {}: {:?}", what, event);
            if done(&event)? {
                return Ok::<(), GarageError>(());
            }
        }
    };

    tokio::time::timeout(HANDSHAKE_TIMEOUT, wait)
        .await
        .map_err(|_| GarageError::Timeout(format!("waiting for {}", what)))?
}
