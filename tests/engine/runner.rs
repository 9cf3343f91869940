// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use motordiag::engine::{
    event_channel, Config, Engine, InboundMessage, LineBridge, MachineState, Transport,
    TransportEvent,
};

use super::fixture::*;

/// Remembers subscriptions, publications and disconnects, optionally
/// failing every publish.
#[derive(Default)]
struct RecordingTransport {
    subscribed: Arc<Mutex<Vec<String>>>,
    published: Arc<Mutex<Vec<(String, String)>>>,
    disconnects: Arc<AtomicUsize>,
    fail_publish: bool,
}

fn recording_engine(transport: RecordingTransport) -> Engine<CountingCatalog> {
    Engine::builder(CountingCatalog::new())
        .config(
            Config::builder()
                .with_custom_output(Box::new(transport))
                .with_timestamp_provider(Box::new(FixedTsProvider {}))
                .build(),
        )
        .build()
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn subscribe(&self, topic: &str) -> Result<(), io::Error> {
        self.subscribed.lock().await.push(topic.to_owned());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), io::Error> {
        if self.fail_publish {
            return Err(io::Error::other("broker unavailable"));
        }
        self.published
            .lock()
            .await
            .push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), io::Error> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_run_loop_processes_events_in_order() -> Result<()> {
    let expected = [json_ready(), json_stopped(), json_must_be_on()];

    check_output(&expected, |engine| async move {
        let (tx, rx) = event_channel();
        tx.send(TransportEvent::Connected).await?;
        tx.send(TransportEvent::Message(InboundMessage::new(
            MACHINE_OFF_TOPIC,
            "",
        )))
        .await?;
        tx.send(TransportEvent::Message(InboundMessage::new(
            COMMAND_TOPIC,
            run_scenario("adjustment_loose"),
        )))
        .await?;
        tx.send(TransportEvent::Disconnected { unexpected: true })
            .await?;
        drop(tx);

        engine.run(rx).await?;
        assert_eq!(engine.machine_state().await, MachineState::Off);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_reconnect_announces_current_state() -> Result<()> {
    let expected = [json_ready(), json_stopped(), json_stopped()];

    check_output(&expected, |engine| async move {
        engine.on_connect().await?;
        engine.handle_message(MACHINE_OFF_TOPIC, b"").await?;
        engine.on_disconnect(true);
        engine.on_connect().await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_connect_subscribes_inbound_topics() -> Result<()> {
    let subscribed = Arc::new(Mutex::new(vec![]));
    let published = Arc::new(Mutex::new(vec![]));

    let engine = recording_engine(RecordingTransport {
        subscribed: subscribed.clone(),
        published: published.clone(),
        ..Default::default()
    });

    engine.on_connect().await?;

    assert_eq!(
        *subscribed.lock().await,
        vec![COMMAND_TOPIC, MACHINE_ON_TOPIC, MACHINE_OFF_TOPIC]
    );

    let published = published.lock().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, STATUS_TOPIC);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&published[0].1)?,
        json_ready()
    );

    Ok(())
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_the_loop() -> Result<()> {
    let engine = recording_engine(RecordingTransport {
        fail_publish: true,
        ..Default::default()
    });

    // the publish error surfaces from a direct call
    assert!(engine.handle_message(MACHINE_OFF_TOPIC, b"").await.is_err());
    assert_eq!(engine.machine_state().await, MachineState::Off);

    let (tx, rx) = event_channel();
    tx.send(TransportEvent::Connected).await?;
    tx.send(TransportEvent::Message(InboundMessage::new(MACHINE_ON_TOPIC, "")))
        .await?;
    tx.send(TransportEvent::Message(InboundMessage::new(
        COMMAND_TOPIC,
        run_scenario("optimal_stable_good"),
    )))
    .await?;
    drop(tx);

    engine.run(rx).await?;

    assert_eq!(engine.machine_state().await, MachineState::On);
    assert_eq!(engine.dispatcher().lock().await.backend().calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_line_bridge_feeds_engine() -> Result<()> {
    let input = concat!(
        r#"{"topic": "unity/motor/command", "payload": {"command": "run_scenario", "scenario": "tight_stable_critical"}}"#,
        "\n",
        r#"{"topic": "unity/motor/command", "payload": "{broken"}"#,
        "\n",
        "not a frame\n",
        r#"{"topic": "unity/motor/machine_off", "payload": ""}"#,
        "\n",
    );

    let expected = [
        json_ready(),
        serde_json::json!({
            "timestamp": DATETIME_FORMATTED,
            "machine_state": "ON",
            "tension": "Tight",
            "stability": "Stable",
            "health": "Critical",
            "scenario": "tight_stable_critical",
            "approach": "Approach 1"
        }),
        json_stopped(),
    ];

    check_output(&expected, |engine| async move {
        let (tx, rx) = event_channel();
        let bridge = tokio::spawn(LineBridge::new(input.as_bytes()).run(tx));

        engine.run(rx).await?;
        bridge.await??;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_end_of_stream_disconnects_transport() -> Result<()> {
    let disconnects = Arc::new(AtomicUsize::new(0));
    let engine = recording_engine(RecordingTransport {
        disconnects: disconnects.clone(),
        ..Default::default()
    });

    let (tx, rx) = event_channel();
    tx.send(TransportEvent::Connected).await?;
    drop(tx);

    engine.run(rx).await?;
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_shutdown_signal_stops_loop_and_disconnects() -> Result<()> {
    let disconnects = Arc::new(AtomicUsize::new(0));
    let published = Arc::new(Mutex::new(vec![]));
    let engine = recording_engine(RecordingTransport {
        published: published.clone(),
        disconnects: disconnects.clone(),
        ..Default::default()
    });

    // the sender stays alive, so only the signal can end the loop
    let (tx, rx) = event_channel();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        engine.run_until(rx, stop_rx).await?;
        anyhow::Ok(())
    });

    tx.send(TransportEvent::Connected).await?;
    tx.send(TransportEvent::Message(InboundMessage::new(
        MACHINE_OFF_TOPIC,
        "",
    )))
    .await?;
    // signalled while events may still be in flight
    let _ = stop_tx.send(());

    handle.await??;
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    assert!(published.lock().await.len() <= 2);
    assert!(tx.is_closed());

    Ok(())
}
