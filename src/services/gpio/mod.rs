pub mod pin_interface;
pub mod gpio_pins;

pub use pin_interface::{ActuatorOutput, PositionSensor};
pub use gpio_pins::{GpioActuator, GpioPins, GpioPositionSensor};
