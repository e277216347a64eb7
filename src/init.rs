use std::future::Future;
use std::sync::Arc;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};
use crate::config::Settings;
use crate::controllers::GarageDoorController;
use crate::event_handling::{CommandHandler, COMMAND_QUEUE_CAPACITY};
use crate::services::gpio::GpioPins;
use crate::services::mqtt::{MqttClient, MqttEventPump};
use crate::state_management::{DoorStateMachine, SensorPoller};


pub struct AppContext {
    pub controller: GarageDoorController,
    pub command_task: JoinHandle<()>,
    pub event_pump_task: JoinHandle<()>,
}

/// Wires the controller to the hardware and the broker.
///
/// 1. Claims the sensor and actuator pins
/// 2. Connects to the broker, announces presence and subscribes to the control topic
/// 3. Builds the door state machine and settles its initial state from one sensor read
/// 4. Spawns the command handler and the MQTT event pump
///
/// Any failure is returned and ends the process; nothing here is retried.
pub async fn initialize(settings: &Settings) -> Result<AppContext> {
    let (sensor, actuator) = GpioPins::open(settings)
        .context("Failed to open GPIO pins")?;

    let (mqtt_client, event_loop) = MqttClient::start(settings)
        .await
        .context("Failed to connect to MQTT broker")?;

    let state_machine = Arc::new(DoorStateMachine::from_settings(
        settings,
        SensorPoller::new(Box::new(sensor)),
        Box::new(actuator),
        Arc::new(mqtt_client.clone()),
    ));

    let initial = state_machine.poll_sensor().await;
    info!("Initial door state: {}", initial);

    let (command_sender, command_receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let command_handler = CommandHandler::new(Arc::clone(&state_machine));
    let command_task = tokio::spawn(command_handler.run(command_receiver));

    let event_pump = MqttEventPump::new(mqtt_client, event_loop, command_sender);
    let event_pump_task = tokio::spawn(event_pump.run());

    let controller = GarageDoorController::from_settings(settings, state_machine);

    Ok(AppContext {
        controller,
        command_task,
        event_pump_task,
    })
}

impl AppContext {
    /// Runs the control loop until `shutdown` resolves or a background task stops.
    ///
    /// The command handler and the event pump are expected to run forever. If either one returns or
    /// panics, remote commands can no longer reach the door, so this returns an error instead of
    /// carrying on without them.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            _ = self.controller.run() => Ok(()),
            joined = &mut self.command_task => Err(worker_stopped("Command handler", joined)),
            joined = &mut self.event_pump_task => Err(worker_stopped("MQTT event pump", joined)),
            _ = shutdown => {
                info!("Received shutdown signal. Shutting down...");
                Ok(())
            }
        };

        self.command_task.abort();
        self.event_pump_task.abort();
        result
    }
}

fn worker_stopped(name: &str, joined: std::result::Result<(), JoinError>) -> anyhow::Error {
    match joined {
        Ok(()) => {
            error!("{} stopped unexpectedly", name);
            anyhow::anyhow!("{} stopped unexpectedly", name)
        }
        Err(e) => {
            error!("{} failed: {}", name, e);
            anyhow::anyhow!("{} failed: {}", name, e)
        }
    }
}
