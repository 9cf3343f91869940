// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt;

use chrono::DateTime;
use chrono::FixedOffset;
use serde::Deserialize;
use serde::Serialize;

/// Request identifier used in error envelopes when the inbound payload
/// could not be read far enough to recover one.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// The only command understood on the command topic (matched case-insensitively).
pub const RUN_SCENARIO: &str = "RUN_SCENARIO";

mod rfc3339_format {
    use chrono::DateTime;
    use chrono::FixedOffset;
    use chrono::SecondsFormat;
    use serde::Deserialize;

    pub fn serialize<S>(date: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = date.to_rfc3339_opts(SecondsFormat::Millis, true);
        serializer.serialize_str(&s)
    }

    // keeps the sender's offset so a re-encoded status is byte-identical
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

/// Power state of the monitored machine.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineState::On => write!(f, "ON"),
            MachineState::Off => write!(f, "OFF"),
        }
    }
}

/// Belt tension classification.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Tension {
    #[serde(rename = "Loose")]
    Loose,
    #[serde(rename = "Optimal")]
    Optimal,
    #[serde(rename = "Tight")]
    Tight,
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// Operational stability classification.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Unstable")]
    Unstable,
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// Health text carried by every status message.
///
/// The first seven variants are diagnostic outcomes stored in scenario
/// records; the rest describe engine conditions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Warning")]
    Warning,
    #[serde(rename = "Critical")]
    Critical,
    #[serde(rename = "Requires Tightening")]
    RequiresTightening,
    #[serde(rename = "Requires Loosening")]
    RequiresLoosening,
    #[serde(rename = "No Adjustment Needed")]
    NoAdjustmentNeeded,
    #[serde(rename = "N/A")]
    NotApplicable,

    #[serde(rename = "Ready")]
    Ready,
    #[serde(rename = "Stopped")]
    Stopped,
    #[serde(rename = "Machine must be ON")]
    MachineMustBeOn,
    #[serde(rename = "Unknown Scenario")]
    UnknownScenario,
}

/// Result shape grouping: stability/health analysis or adjustment advice.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Approach {
    #[serde(rename = "Approach 1")]
    Approach1,
    #[serde(rename = "Approach 2")]
    Approach2,
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Approach::Approach1 => write!(f, "Approach 1"),
            Approach::Approach2 => write!(f, "Approach 2"),
        }
    }
}

/// Payload of the command topic.
/// schema: `{ "command": "RUN_SCENARIO", "scenario": "<identifier>" }`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InboundCommand {
    #[serde(rename = "command")]
    pub command: String,
    #[serde(default)]
    #[serde(rename = "scenario")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

/// The state fields of an outbound status, before it is stamped.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusReport {
    #[serde(rename = "machine_state")]
    pub machine_state: MachineState,
    #[serde(rename = "tension")]
    pub tension: Tension,
    #[serde(rename = "stability")]
    pub stability: Stability,
    #[serde(rename = "health")]
    pub health: Health,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "scenario")]
    pub scenario: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "approach")]
    pub approach: Option<Approach>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "available_scenarios")]
    pub available_scenarios: Option<Vec<String>>,
}

/// Status message published on the status topic.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutboundStatus {
    #[serde(rename = "timestamp")]
    #[serde(with = "rfc3339_format")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub report: StatusReport,
}

/// Error message published instead of a status when a command payload
/// cannot be decoded and error envelopes are enabled.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    #[serde(rename = "request_id")]
    pub request_id: String,
    #[serde(rename = "error")]
    pub error: String,
    #[serde(rename = "timestamp")]
    #[serde(with = "rfc3339_format")]
    pub timestamp: DateTime<FixedOffset>,
}

/// One line of the newline-delimited bridge format, used both by the
/// stdin reader and by the stdout/file transports.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BridgeFrame {
    #[serde(rename = "topic")]
    pub topic: String,
    #[serde(rename = "payload")]
    pub payload: serde_json::Value,
}
