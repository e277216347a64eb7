use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::info;
use crate::config::Settings;
use crate::errors::GarageResult;
use crate::models::PinLevel;
use crate::services::gpio::pin_interface::{ActuatorOutput, PositionSensor};

/// # GpioPins
///
/// Opens the two Raspberry Pi pins the controller owns for the lifetime of the process.
///
/// The sensor input is configured with the internal pull-down so a disconnected sensor reads as closed.
/// The actuator output starts low. `rppal` restores both pins to their previous mode when the handles are dropped,
/// which is how the pins are released on exit.
pub struct GpioPins;

impl GpioPins {
    /// Opens the GPIO peripheral and claims the configured pins.
    ///
    /// # Returns
    ///
    /// * `Ok((GpioPositionSensor, GpioActuator))`: The claimed pins
    /// * `Err(GarageError::GpioError)`: If the peripheral is unavailable or a pin is already in use
    pub fn open(settings: &Settings) -> GarageResult<(GpioPositionSensor, GpioActuator)> {
        let gpio = Gpio::new()?;
        let status = gpio.get(settings.pin_status)?.into_input_pulldown();
        let control = gpio.get(settings.pin_control)?.into_output_low();
        info!("GPIO ready: status pin {}, control pin {}", settings.pin_status, settings.pin_control);
        Ok((GpioPositionSensor { pin: status }, GpioActuator { pin: control }))
    }
}

/// Door position sensor backed by a GPIO input pin
pub struct GpioPositionSensor {
    pin: InputPin,
}

impl PositionSensor for GpioPositionSensor {
    fn read_level(&self) -> PinLevel {
        self.pin.read().into()
    }
}

/// Actuator trigger backed by a GPIO output pin
pub struct GpioActuator {
    pin: OutputPin,
}

impl ActuatorOutput for GpioActuator {
    fn write_level(&mut self, level: PinLevel) {
        self.pin.write(level.into());
    }
}
