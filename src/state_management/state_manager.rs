use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use crate::config::Settings;
use crate::models::{DoorCommand, DoorState, PinLevel};
use crate::services::gpio::ActuatorOutput;
use crate::services::mqtt::StatusTransport;
use crate::state_management::movement_timer::MovementTimer;
use crate::state_management::sensor_data_processor::SensorPoller;

/// How long the actuator output is held high to emulate a button press.
pub const ACTUATOR_PULSE: Duration = Duration::from_millis(250);

/// Everything the state machine mutates, guarded by a single lock.
struct MachineState {
    /// Last state accepted and published.
    current: DoorState,
    /// True from the moment a movement is triggered until its timer has been consumed.
    moving: bool,
    /// The single outstanding movement timer, if any.
    timer: Option<MovementTimer>,
    poller: SensorPoller,
    actuator: Box<dyn ActuatorOutput>,
}

/// Owns the authoritative door state and the pins, and is the only writer of both.
///
/// The control loop and the command handler call into it concurrently; every operation takes the internal
/// lock for its whole duration, including the actuator pulse and the status publish, so operations never
/// interleave.
pub struct DoorStateMachine {
    state: Mutex<MachineState>,
    transport: Arc<dyn StatusTransport>,
    status_topic: String,
    travel_delay: Duration,
}

impl DoorStateMachine {
    /// Creates a new `DoorStateMachine` in the `Unknown` state.
    ///
    /// # Arguments
    ///
    /// * `poller` - Reads the position sensor.
    /// * `actuator` - The output pin that triggers the opener.
    /// * `transport` - Where state changes are published.
    /// * `status_topic` - The topic carrying the retained status code.
    /// * `travel_delay` - How long a movement is assumed to take.
    pub fn new(
        poller: SensorPoller,
        actuator: Box<dyn ActuatorOutput>,
        transport: Arc<dyn StatusTransport>,
        status_topic: impl Into<String>,
        travel_delay: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(MachineState {
                current: DoorState::Unknown,
                moving: false,
                timer: None,
                poller,
                actuator,
            }),
            transport,
            status_topic: status_topic.into(),
            travel_delay,
        }
    }

    /// Creates a new `DoorStateMachine` using the status topic and travel delay from `settings`.
    pub fn from_settings(
        settings: &Settings,
        poller: SensorPoller,
        actuator: Box<dyn ActuatorOutput>,
        transport: Arc<dyn StatusTransport>,
    ) -> Self {
        Self::new(poller, actuator, transport, settings.mqtt_topic_status.clone(), settings.travel_delay())
    }

    pub async fn current_state(&self) -> DoorState {
        self.state.lock().await.current
    }

    pub async fn is_moving(&self) -> bool {
        self.state.lock().await.moving
    }

    /// Starts opening the door if, and only if, it is `Closed`.
    ///
    /// # Returns
    ///
    /// `true` if the request was accepted and the actuator pulsed.
    pub async fn request_open(&self) -> bool {
        self.request_movement(DoorCommand::Open).await
    }

    /// Starts closing the door if, and only if, it is `Open`.
    ///
    /// # Returns
    ///
    /// `true` if the request was accepted and the actuator pulsed.
    pub async fn request_close(&self) -> bool {
        self.request_movement(DoorCommand::Close).await
    }

    /// Marks the movement as in progress, publishes the transitional state, pulses the actuator once
    /// and starts the movement timer.
    async fn request_movement(&self, command: DoorCommand) -> bool {
        let (required, transitional) = match command {
            DoorCommand::Open => (DoorState::Closed, DoorState::Opening),
            DoorCommand::Close => (DoorState::Open, DoorState::Closing),
        };

        let mut state = self.state.lock().await;
        if state.current != required {
            debug!("Ignoring {} request while door is {}", command, state.current);
            return false;
        }
        if state.moving || state.timer.is_some() {
            warn!("Ignoring {} request: a movement is still outstanding", command);
            return false;
        }

        match command {
            DoorCommand::Open => info!("Opening door"),
            DoorCommand::Close => info!("Closing door"),
        }
        state.moving = true;
        self.apply_state(&mut state, transitional).await;
        pulse(state.actuator.as_mut()).await;
        state.timer = Some(MovementTimer::start(self.travel_delay));
        true
    }

    /// Moves to `new_state` and publishes its status code.
    ///
    /// A no-op when `new_state` equals the current state, and `Unknown` is never re-entered.
    ///
    /// # Returns
    ///
    /// `true` if the state changed.
    pub async fn set_state(&self, new_state: DoorState) -> bool {
        let mut state = self.state.lock().await;
        self.apply_state(&mut state, new_state).await
    }

    async fn apply_state(&self, state: &mut MachineState, new_state: DoorState) -> bool {
        if state.current == new_state {
            return false;
        }
        if new_state == DoorState::Unknown {
            warn!("Refusing to move door state from {} back to Unknown", state.current);
            return false;
        }

        info!("Door state from {} to {}", state.current, new_state);
        state.current = new_state;

        if let Some(code) = new_state.status_code() {
            if let Err(e) = self.transport.publish(&self.status_topic, code, true).await {
                error!("Failed to publish door state {}: {}", new_state, e);
            }
        }
        true
    }

    /// Ends the current movement.
    ///
    /// The door state is left untouched; the next sensor poll settles it to whatever the door actually did.
    pub async fn on_movement_complete(&self) {
        let mut state = self.state.lock().await;
        complete_movement(&mut state);
    }

    /// Consumes the movement timer's completion signal if it has arrived. Never blocks.
    ///
    /// # Returns
    ///
    /// `true` if a movement completed during this call.
    pub async fn check_movement_complete(&self) -> bool {
        let mut state = self.state.lock().await;
        let completed = match state.timer.as_mut() {
            Some(timer) => timer.try_complete(),
            None => false,
        };
        if completed {
            complete_movement(&mut state);
        }
        completed
    }

    /// Reads the position sensor and feeds the result to `set_state`.
    ///
    /// # Returns
    ///
    /// The door state after the read.
    pub async fn poll_sensor(&self) -> DoorState {
        let mut state = self.state.lock().await;
        let reading = state.poller.read(state.current, state.moving);
        self.apply_state(&mut state, reading).await;
        state.current
    }
}

fn complete_movement(state: &mut MachineState) {
    if state.current.is_transitional() {
        info!("Movement finished, waiting for sensor to confirm {}", state.current);
    }
    state.moving = false;
    state.timer = None;
}

/// Drives the actuator high for `ACTUATOR_PULSE`, then back low.
async fn pulse(actuator: &mut dyn ActuatorOutput) {
    debug!("Toggling door");
    actuator.write_level(PinLevel::High);
    tokio::time::sleep(ACTUATOR_PULSE).await;
    actuator.write_level(PinLevel::Low);
}
