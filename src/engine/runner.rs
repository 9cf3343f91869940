// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::future::Future;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::engine as en;
use crate::spec;
use en::backend::InferenceBackend;
use en::catalog::ScenarioCatalog;
use en::config::Config;
use en::dispatcher::CommandDispatcher;
use en::error::EngineError;
use en::publisher::StatusPublisher;
use en::transport::TransportEvent;

/// Ties a [`CommandDispatcher`] to a [`StatusPublisher`] and drives both
/// from transport events.
///
/// The dispatcher sits behind a single lock so that the "machine is on"
/// check and the scenario lookup of one command are never split by a
/// concurrent power event.
pub struct Engine<B = ScenarioCatalog> {
    dispatcher: Mutex<CommandDispatcher<B>>,
    publisher: StatusPublisher,
    error_envelope: bool,
}

impl Engine<ScenarioCatalog> {
    /// Creates an engine over the standard catalog with the default [`Config`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # tokio_test::block_on(async {
    /// # use motordiag::engine::*;
    ///
    /// let engine = Engine::new();
    /// engine.handle_message("unity/motor/machine_off", b"").await?;
    /// assert_eq!(engine.machine_state().await, MachineState::Off);
    ///
    /// # Ok::<(), EngineError>(())
    /// # });
    /// ```
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        EngineBuilder::new(ScenarioCatalog::standard()).build()
    }
}

impl<B: InferenceBackend> Engine<B> {
    pub fn builder(backend: B) -> EngineBuilder<B> {
        EngineBuilder::new(backend)
    }

    pub fn dispatcher(&self) -> &Mutex<CommandDispatcher<B>> {
        &self.dispatcher
    }

    pub async fn machine_state(&self) -> spec::MachineState {
        self.dispatcher.lock().await.machine().state()
    }

    /// Subscribes the inbound topics and announces the current machine state.
    pub async fn on_connect(&self) -> Result<(), EngineError> {
        info!("connected to broker");

        let (topics, announcement) = {
            let dispatcher = self.dispatcher.lock().await;
            (dispatcher.topics().clone(), dispatcher.announcement())
        };

        for topic in topics.inbound() {
            self.publisher.transport().subscribe(topic).await?;
            info!("subscribed to: {}", topic);
        }

        self.publisher.publish(announcement).await?;
        Ok(())
    }

    pub fn on_disconnect(&self, unexpected: bool) {
        if unexpected {
            warn!("unexpected disconnection from broker");
        } else {
            info!("disconnected from broker");
        }
    }

    /// Dispatches one inbound message and publishes its outcome, if any.
    ///
    /// A malformed command is logged and, when error envelopes are enabled,
    /// answered with one. Only publish failures are returned.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) -> Result<(), EngineError> {
        let outcome = self.dispatcher.lock().await.handle(topic, payload);

        match outcome {
            Ok(Some(report)) => self.publisher.publish(report).await?,
            Ok(None) => {}
            Err(e) => {
                error!("error processing message: {}", e);
                if self.error_envelope {
                    let envelope = self.publisher.build_error(&e.to_string());
                    self.publisher.send_error(&envelope).await?;
                }
            }
        }

        Ok(())
    }

    /// Processes transport events until the channel closes or Ctrl-C is
    /// received, then disconnects the transport.
    pub async fn run(&self, events: mpsc::Receiver<TransportEvent>) -> Result<(), EngineError> {
        self.run_until(events, tokio::signal::ctrl_c()).await
    }

    /// Like [`Engine::run`], but stops when `shutdown` completes instead of on Ctrl-C.
    pub async fn run_until<S>(
        &self,
        mut events: mpsc::Receiver<TransportEvent>,
        shutdown: S,
    ) -> Result<(), EngineError>
    where
        S: Future,
    {
        info!("starting engine, status topic: {}", self.publisher.topic());

        // armed once so an interrupt during dispatch is not missed
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("transport closed");
                        break;
                    };
                    match event {
                        TransportEvent::Connected => {
                            if let Err(e) = self.on_connect().await {
                                error!("failed to complete connection setup: {}", e);
                            }
                        }
                        TransportEvent::Disconnected { unexpected } => self.on_disconnect(unexpected),
                        TransportEvent::Message(msg) => {
                            if let Err(e) = self.handle_message(&msg.topic, &msg.payload).await {
                                error!("failed to publish status: {}", e);
                            }
                        }
                    }
                }
            }
        }

        events.close();
        match self.publisher.transport().disconnect().await {
            Ok(()) => info!("disconnected transport"),
            Err(e) => error!("failed to disconnect transport: {}", e),
        }
        Ok(())
    }
}

/// Builder for the [`Engine`] object.
pub struct EngineBuilder<B> {
    backend: B,
    config: Option<Config>,
}

impl<B: InferenceBackend> EngineBuilder<B> {
    pub fn new(backend: B) -> Self {
        EngineBuilder {
            backend,
            config: None,
        }
    }

    pub fn config(mut self, value: Config) -> Self {
        self.config = Some(value);
        self
    }

    pub fn build(self) -> Engine<B> {
        let config = self.config.unwrap_or_default();
        let publisher = StatusPublisher::new(
            config.timestamp_provider,
            config.transport,
            &config.topics.status,
        );

        Engine {
            dispatcher: Mutex::new(CommandDispatcher::new(self.backend, config.topics)),
            publisher,
            error_envelope: config.error_envelope,
        }
    }
}
