// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::engine as en;
use en::transport::{self, TransportType};

pub const DEFAULT_COMMAND_TOPIC: &str = "unity/motor/command";
pub const DEFAULT_STATUS_TOPIC: &str = "unity/motor/status";
pub const DEFAULT_MACHINE_ON_TOPIC: &str = "unity/motor/machine_on";
pub const DEFAULT_MACHINE_OFF_TOPIC: &str = "unity/motor/machine_off";

/// Source of the wall-clock time stamped on every outbound message.
pub trait TimestampProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz>;
}

struct ConfiguredTzProvider {
    tz: chrono_tz::Tz,
}

impl TimestampProvider for ConfiguredTzProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        chrono::Utc::now().with_timezone(&self.tz)
    }
}

/// Resolved topic names used by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub command: String,
    pub status: String,
    pub machine_on: String,
    pub machine_off: String,
}

impl Topics {
    /// The three topics the engine subscribes to.
    pub fn inbound(&self) -> [&str; 3] {
        [
            self.command.as_str(),
            self.machine_on.as_str(),
            self.machine_off.as_str(),
        ]
    }
}

impl Default for Topics {
    fn default() -> Self {
        Topics {
            command: DEFAULT_COMMAND_TOPIC.to_owned(),
            status: DEFAULT_STATUS_TOPIC.to_owned(),
            machine_on: DEFAULT_MACHINE_ON_TOPIC.to_owned(),
            machine_off: DEFAULT_MACHINE_OFF_TOPIC.to_owned(),
        }
    }
}

/// The configuration repository for the [`Engine`](crate::engine::Engine).
pub struct Config {
    pub(crate) timestamp_provider: Box<dyn TimestampProvider + Send + Sync + 'static>,
    pub(crate) transport: TransportType,
    pub(crate) topics: Topics,
    pub(crate) error_envelope: bool,
}

impl Config {
    /// Creates a new [`ConfigBuilder`]
    ///
    /// # Examples
    /// ```rust
    /// # use motordiag::engine::*;
    ///
    /// let builder = Config::builder();
    /// ```
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// The builder for the [`Config`] object.
pub struct ConfigBuilder {
    timezone: Option<chrono_tz::Tz>,
    timestamp_provider: Option<Box<dyn TimestampProvider + Send + Sync + 'static>>,
    transport: Option<TransportType>,
    topics: Topics,
    error_envelope: bool,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            timezone: None,
            timestamp_provider: None,
            transport: Some(TransportType::Stdout(transport::StdoutTransport::new())),
            topics: Topics::default(),
            error_envelope: false,
        }
    }

    pub fn timezone(mut self, timezone: chrono_tz::Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn with_timestamp_provider(
        mut self,
        timestamp_provider: Box<dyn TimestampProvider + Send + Sync + 'static>,
    ) -> Self {
        self.timestamp_provider = Some(timestamp_provider);
        self
    }

    pub fn topics(mut self, topics: Topics) -> Self {
        self.topics = topics;
        self
    }

    /// Publish an error envelope when a command payload cannot be decoded.
    pub fn error_envelope(mut self, enabled: bool) -> Self {
        self.error_envelope = enabled;
        self
    }

    pub fn with_buffer_output(mut self, buffer: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        self.transport = Some(TransportType::Buffer(transport::BufferTransport::new(
            buffer,
        )));
        self
    }

    pub async fn with_file_output<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<Self, std::io::Error> {
        self.transport = Some(TransportType::File(
            transport::FileTransport::new(path).await?,
        ));
        Ok(self)
    }

    pub fn with_custom_output(
        mut self,
        custom: Box<dyn transport::Transport + Send + Sync + 'static>,
    ) -> Self {
        self.transport = Some(TransportType::Custom(custom));
        self
    }

    pub fn build(self) -> Config {
        let timezone = self.timezone.unwrap_or(chrono_tz::UTC);
        Config {
            timestamp_provider: self
                .timestamp_provider
                .unwrap_or(Box::new(ConfiguredTzProvider { tz: timezone })),
            transport: self
                .transport
                .unwrap_or(TransportType::Stdout(transport::StdoutTransport::new())),
            topics: self.topics,
            error_envelope: self.error_envelope,
        }
    }
}
