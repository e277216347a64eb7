mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use garage_controller::config::Settings;
use garage_controller::controllers::GarageDoorController;
use garage_controller::event_handling::{CommandHandler, COMMAND_QUEUE_CAPACITY};
use garage_controller::models::{DoorCommand, DoorState, PinLevel};
use garage_controller::state_management::{DoorStateMachine, SensorPoller};
use common::{fixture, RecordingActuator, RecordingTransport, ScriptedSensor};

const SCENARIO_CONFIG: &str = r#"
MQTTServer = "tcp://localhost:1883"
MQTTClientID = "garage-test"
MQTTTopicPresence = "garage/presence"
MQTTTopicControl = "garage/control"
MQTTTopicStatus = "garage/status"
TravelDelay = 10
PinControl = 2
PinStatus = 3
"#;

#[tokio::test(start_paused = true)]
async fn test_run_cycle_polls_then_observes_completion() {
    let f = fixture(PinLevel::Low, Duration::from_secs(10));
    let controller = GarageDoorController::new(Arc::clone(&f.machine), Duration::from_millis(50));

    assert!(!controller.run_cycle().await);
    assert_eq!(f.machine.current_state().await, DoorState::Closed);

    f.machine.request_open().await;
    let reads = f.sensor.reads();
    assert!(!controller.run_cycle().await);
    assert_eq!(f.sensor.reads(), reads, "no polling while a movement is pending");

    f.sensor.set(PinLevel::High);
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(controller.run_cycle().await);
    assert_eq!(f.machine.current_state().await, DoorState::Opening);

    assert!(!controller.run_cycle().await);
    assert_eq!(f.machine.current_state().await, DoorState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_open_command_scenario_end_to_end() {
    let settings = Settings::from_toml_str(SCENARIO_CONFIG).unwrap();
    assert_eq!(settings.travel_delay(), Duration::from_secs(10));

    let sensor = ScriptedSensor::new(PinLevel::Low);
    let actuator = RecordingActuator::default();
    let transport = Arc::new(RecordingTransport::default());
    let machine = Arc::new(DoorStateMachine::from_settings(
        &settings,
        SensorPoller::new(Box::new(sensor.clone())),
        Box::new(actuator.clone()),
        transport.clone(),
    ));

    let controller = GarageDoorController::from_settings(&settings, Arc::clone(&machine));
    let loop_task = tokio::spawn(async move { controller.run().await });

    let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let handler_task = tokio::spawn(CommandHandler::new(Arc::clone(&machine)).run(receiver));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(machine.current_state().await, DoorState::Closed);
    assert_eq!(transport.payloads(), vec!["C"]);

    sender.send(b"O".to_vec()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(machine.current_state().await, DoorState::Opening);
    assert_eq!(transport.payloads(), vec!["C", "U"]);
    assert_eq!(actuator.pulses(), 1);

    sensor.set(PinLevel::High);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(machine.current_state().await, DoorState::Opening, "still travelling");

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(machine.current_state().await, DoorState::Open);
    assert!(!machine.is_moving().await);
    assert_eq!(transport.payloads(), vec!["C", "U", "O"]);
    assert!(transport.messages().iter().all(|m| m.topic == "garage/status" && m.retain));
    assert_eq!(actuator.pulses(), 1);

    loop_task.abort();
    handler_task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_open_command_while_open_has_no_effect() {
    let f = fixture(PinLevel::High, Duration::from_secs(10));
    f.machine.poll_sensor().await;
    let handler = CommandHandler::new(Arc::clone(&f.machine));

    assert!(!handler.handle_payload(b"O").await);

    assert!(f.actuator.writes().is_empty());
    assert_eq!(f.transport.payloads(), vec!["O"]);
    assert_eq!(f.machine.current_state().await, DoorState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_payload_is_ignored() {
    let f = fixture(PinLevel::Low, Duration::from_secs(10));
    f.machine.poll_sensor().await;
    let handler = CommandHandler::new(Arc::clone(&f.machine));

    let payloads: [&[u8]; 5] = [b"X", b"", b"o", b"OPEN", b" O"];
    for payload in payloads {
        assert!(!handler.handle_payload(payload).await);
    }

    assert!(f.actuator.writes().is_empty());
    assert_eq!(f.transport.payloads(), vec!["C"]);
    assert_eq!(f.machine.current_state().await, DoorState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_commands_dropped_while_moving() {
    let f = fixture(PinLevel::Low, Duration::from_secs(10));
    f.machine.poll_sensor().await;
    let handler = CommandHandler::new(Arc::clone(&f.machine));

    assert!(handler.handle(DoorCommand::Open).await);
    assert!(!handler.handle(DoorCommand::Close).await);
    assert!(!handler.handle(DoorCommand::Open).await);

    assert_eq!(f.actuator.pulses(), 1);
    assert_eq!(f.transport.payloads(), vec!["C", "U"]);
}

#[tokio::test(start_paused = true)]
async fn test_close_command_from_open() {
    let f = fixture(PinLevel::High, Duration::from_secs(10));
    f.machine.poll_sensor().await;
    let handler = CommandHandler::new(Arc::clone(&f.machine));

    assert!(handler.handle_payload(b"C").await);

    assert_eq!(f.machine.current_state().await, DoorState::Closing);
    assert_eq!(f.transport.payloads(), vec!["O", "D"]);
}

#[tokio::test(start_paused = true)]
async fn test_pulses_never_exceed_accepted_requests() {
    let f = fixture(PinLevel::Low, Duration::from_secs(3));
    let controller = GarageDoorController::new(Arc::clone(&f.machine), Duration::from_millis(50));
    let handler = CommandHandler::new(Arc::clone(&f.machine));
    controller.run_cycle().await;

    let commands = [
        DoorCommand::Open, DoorCommand::Open, DoorCommand::Close,
        DoorCommand::Close, DoorCommand::Open, DoorCommand::Close,
    ];
    let mut accepted = 0;
    for (i, command) in commands.iter().enumerate() {
        if handler.handle(*command).await {
            accepted += 1;
        }
        // Let the door reach the commanded side on alternate steps.
        if i % 2 == 1 {
            f.sensor.set(if f.machine.current_state().await == DoorState::Opening {
                PinLevel::High
            } else {
                PinLevel::Low
            });
            tokio::time::sleep(Duration::from_secs(4)).await;
            controller.run_cycle().await;
            controller.run_cycle().await;
        }
    }

    assert!(accepted > 0);
    assert_eq!(f.actuator.pulses(), accepted);
    assert_eq!(f.actuator.writes().len(), accepted * 2);
}
