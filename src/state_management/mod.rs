pub mod state_manager;
pub mod sensor_data_processor;
pub mod movement_timer;

pub use state_manager::{DoorStateMachine, ACTUATOR_PULSE};
pub use sensor_data_processor::SensorPoller;
pub use movement_timer::MovementTimer;
