// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::engine as en;
use en::config::{self, Topics};
use en::error::ConfigError;

/// Settings file contents. Every key is optional and falls back to its default.
///
/// ```json
/// {
///   "mqtt": {
///     "broker": "broker.hivemq.com",
///     "port": 1883,
///     "topics": { "command": "...", "status": "...", "machine_on": "...", "machine_off": "..." },
///     "client_id": "motor_inference_engine",
///     "keepalive": 60
///   },
///   "system": { "log_level": "INFO", "error_envelope": false, "models_dir": "models" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mqtt: MqttSettings,
    pub system: SystemSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub topics: TopicSettings,
    pub client_id: String,
    pub keepalive: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        MqttSettings {
            broker: "broker.hivemq.com".to_owned(),
            port: 1883,
            topics: TopicSettings::default(),
            client_id: "motor_inference_engine".to_owned(),
            keepalive: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSettings {
    pub command: String,
    pub status: String,
    pub machine_on: String,
    pub machine_off: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        TopicSettings {
            command: config::DEFAULT_COMMAND_TOPIC.to_owned(),
            status: config::DEFAULT_STATUS_TOPIC.to_owned(),
            machine_on: config::DEFAULT_MACHINE_ON_TOPIC.to_owned(),
            machine_off: config::DEFAULT_MACHINE_OFF_TOPIC.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    pub log_level: String,
    pub error_envelope: bool,
    pub models_dir: PathBuf,
}

impl Default for SystemSettings {
    fn default() -> Self {
        SystemSettings {
            log_level: "INFO".to_owned(),
            error_envelope: false,
            models_dir: PathBuf::from("models"),
        }
    }
}

impl Settings {
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Reads settings from `path`. A missing file yields `Ok(None)`.
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path).await {
            Ok(contents) => Self::from_json(&contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Settles the outcome of [`Settings::read`], logging it and falling
    /// back to defaults on any failure.
    pub fn or_default<P: AsRef<Path>>(path: P, loaded: Result<Option<Self>, ConfigError>) -> Self {
        let path = path.as_ref();
        match loaded {
            Ok(Some(settings)) => {
                info!("loaded settings from {}", path.display());
                settings
            }
            Ok(None) => {
                info!("no settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn topics(&self) -> Topics {
        let t = &self.mqtt.topics;
        Topics {
            command: t.command.clone(),
            status: t.status.clone(),
            machine_on: t.machine_on.clone(),
            machine_off: t.machine_off.clone(),
        }
    }

    /// The log level as an `EnvFilter` directive.
    pub fn log_directive(&self) -> String {
        match self.system.log_level.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_owned(),
            "critical" => "error".to_owned(),
            other => other.to_owned(),
        }
    }
}
