// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::convert::Infallible;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use unwrap_infallible::UnwrapInfallible;

use crate::spec;

/// Publish side of a pub/sub client.
///
/// Implement this to plug a real broker client (MQTT or otherwise) into
/// the engine through [`ConfigBuilder::with_custom_output`](crate::engine::ConfigBuilder::with_custom_output).
#[async_trait]
pub trait Transport {
    async fn subscribe(&self, _topic: &str) -> Result<(), io::Error> {
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), io::Error>;

    /// Called once when the engine stops.
    async fn disconnect(&self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: impl Into<Vec<u8>>) -> Self {
        InboundMessage {
            topic: topic.to_owned(),
            payload: payload.into(),
        }
    }
}

/// Connection lifecycle and message notifications from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected { unexpected: bool },
    Message(InboundMessage),
}

pub enum TransportType {
    // optimization: static dispatch for these known types
    Stdout(StdoutTransport),
    File(FileTransport),
    Buffer(BufferTransport),

    Custom(Box<dyn Transport + Send + Sync + 'static>),
}

impl TransportType {
    pub async fn subscribe(&self, topic: &str) -> Result<(), io::Error> {
        match self {
            TransportType::Custom(custom) => custom.subscribe(topic).await,
            _ => Ok(()),
        }
    }

    pub async fn disconnect(&self) -> Result<(), io::Error> {
        match self {
            TransportType::Custom(custom) => custom.disconnect().await,
            _ => Ok(()),
        }
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), io::Error> {
        match self {
            TransportType::File(file) => file.publish(topic, payload).await?,
            TransportType::Stdout(stdout) => stdout.publish(topic, payload).await.unwrap_infallible(),
            TransportType::Buffer(buffer) => buffer.publish(topic, payload).await.unwrap_infallible(),

            TransportType::Custom(custom) => custom.publish(topic, payload).await?,
        }

        Ok(())
    }
}

/// Renders one bridge frame. Payloads that are not JSON are carried as strings.
fn frame_line(topic: &str, payload: &str) -> String {
    let frame = spec::BridgeFrame {
        topic: topic.to_owned(),
        payload: serde_json::from_str(payload)
            .unwrap_or_else(|_| serde_json::Value::String(payload.to_owned())),
    };
    serde_json::json!(frame).to_string()
}

/// Appends every published message to a file, one bridge frame per line.
pub struct FileTransport {
    file: Arc<Mutex<fs::File>>,
}

impl FileTransport {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let file = fs::File::create(path).await?;
        Ok(FileTransport {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), io::Error> {
        let mut handle = self.file.lock().await;

        let mut buf = Vec::<u8>::new();
        writeln!(buf, "{}", frame_line(topic, payload))?;

        handle.write_all(&buf).await?;
        handle.flush().await?;

        Ok(())
    }
}

/// Collects `(topic, payload)` pairs in memory.
#[derive(Debug)]
pub struct BufferTransport {
    buffer: Arc<Mutex<Vec<(String, String)>>>,
}

impl BufferTransport {
    pub fn new(buffer: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        Self { buffer }
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), Infallible> {
        self.buffer
            .lock()
            .await
            .push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StdoutTransport {}

#[allow(clippy::new_without_default)]
impl StdoutTransport {
    pub fn new() -> Self {
        StdoutTransport {}
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), Infallible> {
        println!("{}", frame_line(topic, payload));
        Ok(())
    }
}
