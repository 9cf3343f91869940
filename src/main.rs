// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use motordiag::engine::{
    event_channel, Config, Engine, EngineError, LineBridge, ModelInventory, ScenarioCatalog,
    Settings,
};

/// Scenario diagnostic engine.
///
/// Reads `{"topic": ..., "payload": ...}` frames from stdin and writes
/// published status frames to stdout.
#[derive(Parser, Debug)]
#[command(name = "motordiag", version, about)]
struct Cli {
    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(short, long, default_value = "config.json", env = "MOTORDIAG_CONFIG")]
    config: PathBuf,

    /// Overrides the settings log level (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Write published frames to this file instead of stdout
    #[arg(long)]
    record: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<(), EngineError> {
    let loaded = Settings::read(&cli.config).await;

    let directive = cli.log_level.map(|level| level.to_ascii_lowercase()).unwrap_or_else(|| {
        match &loaded {
            Ok(Some(settings)) => settings.log_directive(),
            _ => Settings::default().log_directive(),
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::or_default(&cli.config, loaded);

    let catalog = ScenarioCatalog::standard();
    catalog.log_available();

    let inventory = ModelInventory::scan(&settings.system.models_dir).await;
    if inventory.is_available() {
        info!(
            "model artifacts available in {}, scenarios still resolve through the catalog",
            inventory.dir().display()
        );
    }

    let mut config = Config::builder()
        .topics(settings.topics())
        .error_envelope(settings.system.error_envelope);
    if let Some(path) = &cli.record {
        config = config.with_file_output(path).await?;
    }

    let engine = Engine::builder(catalog).config(config.build()).build();

    info!(
        "bridging {}:{} as {} (keepalive {}s) over stdio",
        settings.mqtt.broker, settings.mqtt.port, settings.mqtt.client_id, settings.mqtt.keepalive
    );
    let (tx, rx) = event_channel();
    let bridge = tokio::spawn(LineBridge::new(BufReader::new(tokio::io::stdin())).run(tx));

    engine.run(rx).await?;
    bridge.abort();

    Ok(())
}

fn main() -> Result<(), EngineError> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));

    // a pending stdin read holds a blocking thread that cannot be cancelled
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}
