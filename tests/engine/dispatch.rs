// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use serde_json::json;

use motordiag::engine::MachineState;

use super::fixture::*;

#[tokio::test]
async fn test_run_scenario_publishes_record() -> Result<()> {
    let expected = [json!({
        "timestamp": DATETIME_FORMATTED,
        "machine_state": "ON",
        "tension": "Loose",
        "stability": "N/A",
        "health": "Requires Tightening",
        "scenario": "adjustment_loose",
        "approach": "Approach 2"
    })];

    check_output(&expected, |engine| async move {
        engine
            .handle_message(
                COMMAND_TOPIC,
                br#"{"command":"RUN_SCENARIO","scenario":"adjustment_loose"}"#,
            )
            .await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_approach_one_scenario() -> Result<()> {
    let expected = [json!({
        "timestamp": DATETIME_FORMATTED,
        "machine_state": "ON",
        "tension": "Optimal",
        "stability": "Unstable",
        "health": "Warning",
        "scenario": "optimal_unstable_warning",
        "approach": "Approach 1"
    })];

    check_output(&expected, |engine| async move {
        engine
            .handle_message(COMMAND_TOPIC, &run_scenario(" OPTIMAL_unstable_warning"))
            .await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_power_off_then_run_is_refused() -> Result<()> {
    let expected = [json_stopped(), json_must_be_on()];

    check_output(&expected, |engine| async move {
        engine.handle_message(MACHINE_OFF_TOPIC, b"").await?;
        engine
            .handle_message(COMMAND_TOPIC, &run_scenario("optimal_stable_good"))
            .await?;

        assert_eq!(engine.machine_state().await, MachineState::Off);
        assert_eq!(engine.dispatcher().lock().await.backend().calls(), 0);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_power_on_twice_publishes_once() -> Result<()> {
    let expected = [json_stopped(), json_ready()];

    check_output(&expected, |engine| async move {
        engine.handle_message(MACHINE_OFF_TOPIC, b"").await?;
        engine.handle_message(MACHINE_ON_TOPIC, b"").await?;
        engine.handle_message(MACHINE_ON_TOPIC, b"").await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_power_on_at_startup_publishes_nothing() -> Result<()> {
    check_output(&[], |engine| async move {
        engine.handle_message(MACHINE_ON_TOPIC, b"{}").await?;
        assert_eq!(engine.machine_state().await, MachineState::On);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_power_cycle_restores_scenarios() -> Result<()> {
    let expected = [
        json_stopped(),
        json_must_be_on(),
        json_ready(),
        json!({
            "timestamp": DATETIME_FORMATTED,
            "machine_state": "ON",
            "tension": "Tight",
            "stability": "N/A",
            "health": "Requires Loosening",
            "scenario": "adjustment_tight",
            "approach": "Approach 2"
        }),
    ];

    check_output(&expected, |engine| async move {
        engine.handle_message(MACHINE_OFF_TOPIC, b"").await?;
        engine
            .handle_message(COMMAND_TOPIC, &run_scenario("adjustment_tight"))
            .await?;
        engine.handle_message(MACHINE_ON_TOPIC, b"").await?;
        engine
            .handle_message(COMMAND_TOPIC, &run_scenario("adjustment_tight"))
            .await?;

        assert_eq!(engine.dispatcher().lock().await.backend().calls(), 1);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unknown_scenario_publishes_hints() -> Result<()> {
    let expected = [json!({
        "timestamp": DATETIME_FORMATTED,
        "machine_state": "ON",
        "tension": "N/A",
        "stability": "N/A",
        "health": "Unknown Scenario",
        "scenario": "not_a_real_scenario",
        "available_scenarios": [
            "loose_unstable_good",
            "optimal_stable_good",
            "optimal_unstable_warning",
            "tight_stable_critical",
            "adjustment_loose"
        ]
    })];

    check_output(&expected, |engine| async move {
        engine
            .handle_message(COMMAND_TOPIC, &run_scenario("Not_A_Real_Scenario"))
            .await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unrecognized_command_publishes_nothing() -> Result<()> {
    check_output(&[], |engine| async move {
        engine
            .handle_message(
                COMMAND_TOPIC,
                br#"{"command":"CALIBRATE","scenario":"adjustment_loose"}"#,
            )
            .await?;

        assert_eq!(engine.dispatcher().lock().await.backend().calls(), 0);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unknown_topic_publishes_nothing() -> Result<()> {
    check_output(&[], |engine| async move {
        engine
            .handle_message("unity/motor/telemetry", &run_scenario("adjustment_loose"))
            .await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_malformed_command_is_only_logged_by_default() -> Result<()> {
    check_output(&[], |engine| async move {
        engine.handle_message(COMMAND_TOPIC, b"{not json").await?;
        engine
            .handle_message(COMMAND_TOPIC, br#"{"scenario":"adjustment_loose"}"#)
            .await?;
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn test_malformed_command_with_error_envelope() -> Result<()> {
    let buffer = std::sync::Arc::new(tokio::sync::Mutex::new(vec![]));

    let engine = motordiag::engine::Engine::builder(CountingCatalog::new())
        .config(
            motordiag::engine::Config::builder()
                .with_buffer_output(buffer.clone())
                .with_timestamp_provider(Box::new(FixedTsProvider {}))
                .error_envelope(true)
                .build(),
        )
        .build();

    engine.handle_message(COMMAND_TOPIC, b"{not json").await?;

    let outputs = buffer.lock().await;
    assert_eq!(outputs.len(), 1);
    let (topic, payload) = &outputs[0];
    assert_eq!(topic, STATUS_TOPIC);

    let value = serde_json::from_str::<serde_json::Value>(payload)?;
    assert_eq!(value["request_id"], "unknown");
    assert_eq!(value["timestamp"], DATETIME_FORMATTED);
    let error = value["error"].as_str().unwrap_or_default();
    assert!(error.starts_with("malformed command payload"), "{error}");

    Ok(())
}

#[tokio::test]
async fn test_custom_topics_are_routed() -> Result<()> {
    let topics = motordiag::engine::Topics {
        command: "sim/cmd".to_owned(),
        status: STATUS_TOPIC.to_owned(),
        machine_on: "sim/on".to_owned(),
        machine_off: "sim/off".to_owned(),
    };

    check_output_config(
        &[json_stopped()],
        |builder| builder.topics(topics),
        |engine| async move {
            // default topics are no longer routed
            engine.handle_message(MACHINE_OFF_TOPIC, b"").await?;
            assert_eq!(engine.machine_state().await, MachineState::On);

            engine.handle_message("sim/off", b"").await?;
            anyhow::Ok(())
        },
    )
    .await
}
