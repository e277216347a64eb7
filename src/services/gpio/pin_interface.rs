use crate::models::PinLevel;

/// # PositionSensor
///
/// The digital input wired to the door position sensor.
/// A `High` level means the door is open.
pub trait PositionSensor: Send {
    /// Samples the current level of the input.
    fn read_level(&self) -> PinLevel;
}

/// # ActuatorOutput
///
/// The digital output wired to the opener's push-button contacts.
/// It idles `Low`; the state machine drives it `High` only for the duration of a pulse.
pub trait ActuatorOutput: Send {
    /// Drives the output to `level`.
    fn write_level(&mut self, level: PinLevel);
}
