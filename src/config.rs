//! # Configuration Management

//! This module handles loading the garage controller configuration.
//! It leverages the `config` crate to read a single TOML file, selected on the command line, once at startup.
//! Keys are snake_case; the PascalCase names used by older controller files (`MQTTServer`, `TravelDelay`, ...) are accepted as aliases.

use serde::Deserialize;
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use secrecy::Secret;
use tracing::debug;
use url::Url;
use crate::errors::{GarageError, GarageResult};

/// Port used when the broker address does not name one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Represents the complete, immutable configuration of a garage controller.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Broker address, e.g. `tcp://broker.local:1883`
    #[serde(alias = "MQTTServer", alias = "mqttserver")]
    pub mqtt_server: String,
    /// Username for broker authentication; empty connects anonymously
    #[serde(default, alias = "MQTTUsername", alias = "mqttusername")]
    pub mqtt_username: String,
    /// Password for broker authentication
    #[serde(default, deserialize_with = "deserialize_optional_secret", alias = "MQTTPassword", alias = "mqttpassword")]
    pub mqtt_password: Option<Secret<String>>,
    /// Client identifier presented to the broker
    #[serde(alias = "MQTTClientID", alias = "mqttclientid")]
    pub mqtt_client_id: String,
    /// Topic used to announce liveness (`GBP-ONLINE` / last will `GBP-OFFLINE`)
    #[serde(alias = "MQTTTopicPresence", alias = "mqtttopicpresence")]
    pub mqtt_topic_presence: String,
    /// Topic on which open/close commands arrive
    #[serde(alias = "MQTTTopicControl", alias = "mqtttopiccontrol")]
    pub mqtt_topic_control: String,
    /// Topic on which the retained door status is published
    #[serde(alias = "MQTTTopicStatus", alias = "mqtttopicstatus")]
    pub mqtt_topic_status: String,
    /// Seconds a full open or close movement is assumed to take
    #[serde(alias = "TravelDelay", alias = "traveldelay")]
    pub travel_delay: u64,
    /// BCM number of the door position sensor input
    #[serde(alias = "PinStatus", alias = "pinstatus")]
    pub pin_status: u8,
    /// BCM number of the actuator trigger output
    #[serde(alias = "PinControl", alias = "pincontrol")]
    pub pin_control: u8,
    /// Control loop cadence in milliseconds
    #[serde(default = "default_poll_interval_ms", alias = "PollIntervalMs", alias = "pollintervalms")]
    pub poll_interval_ms: u64,
    /// Settings for application logging
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// The logging level used when `RUST_LOG` is not set (e.g., "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// The directory where daily log files will be stored (optional)
    pub path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            path: None,
        }
    }
}

/// Host and port of the MQTT broker, resolved from `mqtt_server`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads the settings from the TOML file at `path`.
    ///
    /// The file is read regardless of its extension (the conventional name is `controller.config`).
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the file was read, deserialized and validated
    /// * `Err(GarageError)`: If the file is missing, malformed or fails validation
    pub fn new(path: &Path) -> GarageResult<Self> {
        debug!("Loading configuration from {:?}", path);
        let s = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?;
        Self::from_config(s)
    }

    /// Builds the settings from TOML text instead of a file.
    pub fn from_toml_str(contents: &str) -> GarageResult<Self> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Self::from_config(s)
    }

    fn from_config(s: Config) -> GarageResult<Self> {
        let mut settings: Self = s.try_deserialize::<Settings>()
            .map_err(GarageError::from)?;

        if let Some(ref mut path) = settings.logging.path {
            if path.is_relative() {
                *path = std::env::current_dir()?.join(path.clone());
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> GarageResult<()> {
        let required = [
            ("mqtt_client_id", &self.mqtt_client_id),
            ("mqtt_topic_presence", &self.mqtt_topic_presence),
            ("mqtt_topic_control", &self.mqtt_topic_control),
            ("mqtt_topic_status", &self.mqtt_topic_status),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(GarageError::ConfigError(format!("{} must not be empty", name)));
            }
        }
        if self.mqtt_client_id.starts_with(char::is_whitespace) {
            return Err(GarageError::ConfigError("mqtt_client_id must not start with whitespace".to_string()));
        }
        if self.pin_status == self.pin_control {
            return Err(GarageError::ConfigError(format!(
                "pin_status and pin_control must differ (both are {})",
                self.pin_status
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(GarageError::ConfigError("poll_interval_ms must be positive".to_string()));
        }
        self.broker_address()?;
        Ok(())
    }

    /// Resolves `mqtt_server` into a host and port.
    ///
    /// Accepts `tcp://`, `mqtt://` or no scheme at all; a missing port defaults to 1883.
    pub fn broker_address(&self) -> GarageResult<BrokerAddress> {
        let raw = self.mqtt_server.trim();
        let url = if raw.contains("://") {
            Url::parse(raw)?
        } else {
            Url::parse(&format!("tcp://{}", raw))?
        };

        match url.scheme() {
            "tcp" | "mqtt" => {}
            other => {
                return Err(GarageError::ConfigError(format!(
                    "Unsupported broker scheme '{}' in '{}'",
                    other, raw
                )))
            }
        }

        let host = url.host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| GarageError::ConfigError(format!("Broker address '{}' has no host", raw)))?;

        Ok(BrokerAddress {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
        })
    }

    /// The configured travel delay as a `Duration`
    pub fn travel_delay(&self) -> Duration {
        Duration::from_secs(self.travel_delay)
    }

    /// The control loop cadence as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Deserializes a secret string from configuration into a `Secret<String>`
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()).map(Secret::new))
}
