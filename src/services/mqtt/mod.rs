pub mod transport;
pub mod mqtt_client;
pub mod event_pump;

pub use transport::StatusTransport;
pub use mqtt_client::MqttClient;
pub use event_pump::{forward_control, MqttEventPump};
