use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use crate::models::DoorCommand;
use crate::state_management::DoorStateMachine;

/// Capacity of the queue between the MQTT event pump and the command handler
pub const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Translates control-topic messages into open/close requests on the door state machine.
#[derive(Clone)]
pub struct CommandHandler {
    machine: Arc<DoorStateMachine>,
}

impl CommandHandler {
    /// Creates a new `CommandHandler`.
    ///
    /// # Arguments
    ///
    /// * `machine` - The state machine that receives the requests.
    pub fn new(machine: Arc<DoorStateMachine>) -> Self {
        Self { machine }
    }

    /// Handles one raw control-topic payload.
    ///
    /// Payloads other than `O` and `C` are ignored without side effects.
    ///
    /// # Returns
    ///
    /// `true` if a movement was started.
    pub async fn handle_payload(&self, payload: &[u8]) -> bool {
        match DoorCommand::parse(payload) {
            Some(command) => self.handle(command).await,
            None => {
                debug!("Ignoring control payload {:?}", String::from_utf8_lossy(payload));
                false
            }
        }
    }

    /// Dispatches a parsed command.
    ///
    /// Commands are dropped while a movement is in progress, before the state machine applies its own
    /// state precondition.
    pub async fn handle(&self, command: DoorCommand) -> bool {
        if self.machine.is_moving().await {
            debug!("Ignoring {} command while the door is moving", command);
            return false;
        }

        match command {
            DoorCommand::Open => self.machine.request_open().await,
            DoorCommand::Close => self.machine.request_close().await,
        }
    }

    /// Processes payloads from `receiver` until every sender is gone.
    pub async fn run(self, mut receiver: mpsc::Receiver<Vec<u8>>) {
        info!("Starting command handler");
        while let Some(payload) = receiver.recv().await {
            self.handle_payload(&payload).await;
        }
        info!("Command channel closed, command handler stopped");
    }
}
