use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::state_management::DoorStateMachine;

/// The control loop: the single scheduling point that polls the sensor and observes movement completion
pub struct GarageDoorController {
    /// The state machine the loop drives
    pub state_machine: Arc<DoorStateMachine>,
    /// Pause between iterations that found nothing to do
    pub poll_interval: Duration,
}

impl GarageDoorController {
    /// Creates a new `GarageDoorController`
    ///
    /// # Arguments
    ///
    /// * `state_machine`: The `DoorStateMachine` to drive
    /// * `poll_interval`: The loop cadence
    pub fn new(state_machine: Arc<DoorStateMachine>, poll_interval: Duration) -> Self {
        info!("Initializing Garage Door Controller");
        Self { state_machine, poll_interval }
    }

    /// Creates a new `GarageDoorController` with the cadence from `settings`
    pub fn from_settings(settings: &Settings, state_machine: Arc<DoorStateMachine>) -> Self {
        Self::new(state_machine, settings.poll_interval())
    }

    /// Executes a single loop iteration
    ///
    /// 1. If no movement is in progress, reads the sensor and feeds the result to the state machine
    /// 2. Consumes a movement completion signal if one has arrived, clearing the moving flag
    ///
    /// # Returns
    ///
    /// * `true` if a movement completed during this iteration
    pub async fn run_cycle(&self) -> bool {
        if !self.state_machine.is_moving().await {
            self.state_machine.poll_sensor().await;
        }

        self.state_machine.check_movement_complete().await
    }

    /// Runs the loop until the process exits
    ///
    /// Sleeps for `poll_interval` after every iteration that did not observe a completion, so the sensor
    /// is read again straight after a movement ends.
    pub async fn run(&self) {
        info!("Starting control loop ({:?} cadence)", self.poll_interval);
        loop {
            if !self.run_cycle().await {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}
