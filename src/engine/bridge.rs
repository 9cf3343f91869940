// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::engine as en;
use crate::spec;
use en::transport::{InboundMessage, TransportEvent};

pub const EVENT_QUEUE_DEPTH: usize = 64;

/// Creates the event channel shared by a transport and the engine.
pub fn event_channel() -> (mpsc::Sender<TransportEvent>, mpsc::Receiver<TransportEvent>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}

/// Parses one `{ "topic": ..., "payload": ... }` line.
///
/// String payloads are delivered verbatim, anything else as its JSON text.
pub fn parse_frame(line: &[u8]) -> Result<InboundMessage, serde_json::Error> {
    let frame = serde_json::from_slice::<spec::BridgeFrame>(line)?;
    let payload = match frame.payload {
        serde_json::Value::String(s) => s.into_bytes(),
        other => other.to_string().into_bytes(),
    };
    Ok(InboundMessage {
        topic: frame.topic,
        payload,
    })
}

/// Turns newline-delimited bridge frames from a reader into transport events.
pub struct LineBridge<R> {
    reader: R,
}

impl<R> LineBridge<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        LineBridge { reader }
    }

    /// Emits `Connected`, then one `Message` per readable line, then
    /// `Disconnected`. Lines that do not decode are logged and skipped;
    /// only a read failure ends the stream early. Returns early if the
    /// receiving side is gone.
    pub async fn run(mut self, tx: mpsc::Sender<TransportEvent>) -> Result<(), io::Error> {
        if tx.send(TransportEvent::Connected).await.is_err() {
            return Ok(());
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    let _ = tx
                        .send(TransportEvent::Disconnected { unexpected: true })
                        .await;
                    return Err(e);
                }
            }

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match parse_frame(&buf) {
                Ok(msg) => {
                    if tx.send(TransportEvent::Message(msg)).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => warn!("skipping unreadable frame: {}", e),
            }
        }

        let _ = tx
            .send(TransportEvent::Disconnected { unexpected: false })
            .await;
        Ok(())
    }
}
