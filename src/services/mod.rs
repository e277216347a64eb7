pub mod gpio;
pub mod mqtt;

pub use gpio::{ActuatorOutput, PositionSensor};
pub use mqtt::{MqttClient, StatusTransport};
