/// # Garage Controller Errors
/// This module defines the `GarageError` enum, which encapsulates all potential errors that can occur within the garage controller.
/// Startup code propagates these as fatal errors; the runtime paths log them and keep the control loop alive.


use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum GarageError {
    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents failures to open or drive the GPIO pins.
    #[error("GPIO error: {0}")]
    GpioError(String),

    /// Represents errors related to establishing or maintaining the broker connection.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Represents errors handing a message to the transport client.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Represents a subscription the broker refused.
    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    /// Represents an operation that did not complete within its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl From<config::ConfigError> for GarageError {
    fn from(err: config::ConfigError) -> Self {
        GarageError::ConfigError(err.to_string())
    }
}

impl From<url::ParseError> for GarageError {
    fn from(err: url::ParseError) -> Self {
        GarageError::ConfigError(format!("Invalid broker address: {}", err))
    }
}

impl From<rppal::gpio::Error> for GarageError {
    fn from(err: rppal::gpio::Error) -> Self {
        GarageError::GpioError(err.to_string())
    }
}

impl From<rumqttc::ConnectionError> for GarageError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        GarageError::ConnectionError(err.to_string())
    }
}

impl From<rumqttc::ClientError> for GarageError {
    fn from(err: rumqttc::ClientError) -> Self {
        GarageError::TransportError(err.to_string())
    }
}

pub type GarageResult<T> = Result<T, GarageError>;
