use crate::models::{DoorState, PinLevel};
use crate::services::gpio::PositionSensor;

/// Turns position sensor samples into door states.
pub struct SensorPoller {
    /// The input pin wired to the door position sensor.
    sensor: Box<dyn PositionSensor>,
}

impl SensorPoller {
    /// Creates a new `SensorPoller`.
    ///
    /// # Arguments
    ///
    /// * `sensor` - The input pin to sample.
    pub fn new(sensor: Box<dyn PositionSensor>) -> Self {
        Self { sensor }
    }

    /// Reads the door state from the sensor.
    ///
    /// While a movement is in progress the door is between its end positions, which the binary sensor
    /// cannot represent, so `current` is returned unchanged and the pin is not sampled.
    /// Otherwise a high level maps to `Open` and a low level to `Closed`; this never yields `Unknown`.
    ///
    /// # Arguments
    ///
    /// * `current` - The state last accepted by the state machine.
    /// * `moving` - Whether a movement is in progress.
    pub fn read(&self, current: DoorState, moving: bool) -> DoorState {
        if moving {
            return current;
        }

        match self.sensor.read_level() {
            PinLevel::High => DoorState::Open,
            PinLevel::Low => DoorState::Closed,
        }
    }
}
