//! # Remote Door Commands

//! Payloads accepted on the control topic and the presence announcements sent on the presence topic.

use serde::{Deserialize, Serialize};
use derive_more::Display;

/// Presence payload announced after a successful connection.
pub const PRESENCE_ONLINE: &str = "GBP-ONLINE";
/// Presence payload registered as the connection's last will.
pub const PRESENCE_OFFLINE: &str = "GBP-OFFLINE";

/// A command received on the control topic.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display)]
pub enum DoorCommand {
    /// Payload `O`.
    Open,
    /// Payload `C`.
    Close,
}

impl DoorCommand {
    /// Parses a raw control-topic payload.
    ///
    /// Only the exact payloads `O` and `C` are commands; anything else returns `None`.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            b"O" => Some(DoorCommand::Open),
            b"C" => Some(DoorCommand::Close),
            _ => None,
        }
    }
}
