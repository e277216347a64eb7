//! Test doubles for the pin interface and the transport.
//!
//! Each double records what the state machine did so tests can assert on the full history
//! without real GPIO or a broker.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use garage_controller::errors::{GarageError, GarageResult};
use garage_controller::models::PinLevel;
use garage_controller::services::gpio::{ActuatorOutput, PositionSensor};
use garage_controller::services::mqtt::StatusTransport;
use garage_controller::state_management::{DoorStateMachine, SensorPoller};

pub const STATUS_TOPIC: &str = "garage/status";

// ── Position sensor ───────────────────────────────────────────

/// A sensor whose level the test sets directly.
#[derive(Clone)]
pub struct ScriptedSensor {
    level: Arc<Mutex<PinLevel>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSensor {
    pub fn new(level: PinLevel) -> Self {
        Self {
            level: Arc::new(Mutex::new(level)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, level: PinLevel) {
        *self.level.lock() = level;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PositionSensor for ScriptedSensor {
    fn read_level(&self) -> PinLevel {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self.level.lock()
    }
}

// ── Actuator ──────────────────────────────────────────────────

/// An actuator that records every level written to it.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    writes: Arc<Mutex<Vec<PinLevel>>>,
}

impl RecordingActuator {
    pub fn writes(&self) -> Vec<PinLevel> {
        self.writes.lock().clone()
    }

    /// Number of completed high-then-low pulses.
    pub fn pulses(&self) -> usize {
        self.writes
            .lock()
            .windows(2)
            .filter(|w| w[0] == PinLevel::High && w[1] == PinLevel::Low)
            .count()
    }
}

impl ActuatorOutput for RecordingActuator {
    fn write_level(&mut self, level: PinLevel) {
        self.writes.lock().push(level);
    }
}

// ── Transport ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// A transport that records publishes, optionally failing them all.
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<Published>>,
    fail: Mutex<bool>,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<Published> {
        self.messages.lock().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.payload.clone()).collect()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl StatusTransport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> GarageResult<()> {
        if *self.fail.lock() {
            return Err(GarageError::TransportError("broker unreachable".to_string()));
        }
        self.messages.lock().push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retain,
        });
        Ok(())
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Fixture {
    pub machine: Arc<DoorStateMachine>,
    pub sensor: ScriptedSensor,
    pub actuator: RecordingActuator,
    pub transport: Arc<RecordingTransport>,
}

/// Builds a state machine over test doubles, with the sensor starting at `level`.
pub fn fixture(level: PinLevel, travel_delay: Duration) -> Fixture {
    let sensor = ScriptedSensor::new(level);
    let actuator = RecordingActuator::default();
    let transport = Arc::new(RecordingTransport::default());
    let machine = Arc::new(DoorStateMachine::new(
        SensorPoller::new(Box::new(sensor.clone())),
        Box::new(actuator.clone()),
        transport.clone(),
        STATUS_TOPIC,
        travel_delay,
    ));
    Fixture { machine, sensor, actuator, transport }
}
