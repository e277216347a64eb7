//! # Garage Door State Enums

//! This module defines the enums describing the physical door and the electrical level of its pins.
//! The status codes published on the status topic are derived from `DoorState` here, so every producer and consumer of those codes shares one mapping.

use serde::{Deserialize, Serialize};
use derive_more::Display;

/// Represents the state of the garage door as tracked by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display)]
pub enum DoorState {
    /// The door is fully open.
    Open,
    /// The door is fully closed.
    Closed,
    /// A movement towards open is in progress.
    Opening,
    /// A movement towards closed is in progress.
    Closing,
    /// No sensor reading has been accepted yet. Only valid before the first read.
    Unknown,
}

impl DoorState {
    /// Returns the single-character code published on the status topic.
    ///
    /// `Unknown` has no code and is never published.
    pub fn status_code(&self) -> Option<&'static str> {
        match self {
            DoorState::Open => Some("O"),
            DoorState::Closed => Some("C"),
            DoorState::Opening => Some("U"),
            DoorState::Closing => Some("D"),
            DoorState::Unknown => None,
        }
    }

    /// Whether the state only exists while a movement is in progress.
    pub fn is_transitional(&self) -> bool {
        matches!(self, DoorState::Opening | DoorState::Closing)
    }
}

/// Represents the electrical level of a digital pin.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display)]
pub enum PinLevel {
    Low,
    High,
}

impl From<rppal::gpio::Level> for PinLevel {
    fn from(level: rppal::gpio::Level) -> Self {
        match level {
            rppal::gpio::Level::Low => PinLevel::Low,
            rppal::gpio::Level::High => PinLevel::High,
        }
    }
}

impl From<PinLevel> for rppal::gpio::Level {
    fn from(level: PinLevel) -> Self {
        match level {
            PinLevel::Low => rppal::gpio::Level::Low,
            PinLevel::High => rppal::gpio::Level::High,
        }
    }
}
