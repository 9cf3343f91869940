// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;

use tracing::info;

use crate::engine as en;
use crate::spec;
use en::config;
use en::transport::TransportType;

/// Stamps status reports with the current time and publishes them as JSON
/// on the status topic.
pub struct StatusPublisher {
    timestamp_provider: Box<dyn config::TimestampProvider + Send + Sync + 'static>,
    transport: TransportType,
    topic: String,
}

impl StatusPublisher {
    pub(crate) fn new(
        timestamp_provider: Box<dyn config::TimestampProvider + Send + Sync + 'static>,
        transport: TransportType,
        topic: &str,
    ) -> Self {
        StatusPublisher {
            timestamp_provider,
            transport,
            topic: topic.to_owned(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn transport(&self) -> &TransportType {
        &self.transport
    }

    pub fn build(&self, report: spec::StatusReport) -> spec::OutboundStatus {
        spec::OutboundStatus {
            timestamp: self.timestamp_provider.now().fixed_offset(),
            report,
        }
    }

    pub fn build_error(&self, message: &str) -> spec::ErrorEnvelope {
        spec::ErrorEnvelope {
            request_id: spec::UNKNOWN_REQUEST_ID.to_owned(),
            error: message.to_owned(),
            timestamp: self.timestamp_provider.now().fixed_offset(),
        }
    }

    pub async fn send(&self, status: &spec::OutboundStatus) -> Result<(), io::Error> {
        let s = serde_json::json!(status).to_string();
        self.transport.publish(&self.topic, &s).await?;
        info!(topic = %self.topic, "published: {}", s);
        Ok(())
    }

    pub async fn send_error(&self, envelope: &spec::ErrorEnvelope) -> Result<(), io::Error> {
        let s = serde_json::json!(envelope).to_string();
        self.transport.publish(&self.topic, &s).await?;
        info!(topic = %self.topic, "published error: {}", s);
        Ok(())
    }

    /// Builds and sends in one step.
    pub async fn publish(&self, report: spec::StatusReport) -> Result<(), io::Error> {
        let status = self.build(report);
        self.send(&status).await
    }
}
