//! thinview client entry point.
//!
//! Wires the Tokio transport, the headless display, the stdin input source,
//! and the controller to one event channel, then runs the event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()              -- THINVIEW_CONFIG or first argument
//!  └─ ClientController::init()   -- capability check, resolve endpoint
//!  └─ ViewChanged(display size)  -- first surface, first frame cycle
//!  └─ event loop
//!       ├─ ClientEvent           -> ClientController::handle_event
//!       ├─ retry delay pending   -> spawn RetryConnect timer
//!       └─ Ctrl-C                -> exit
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use thinview_client::application::controller::{ClientController, ClientEvent};
use thinview_client::infrastructure::{
    display::HeadlessDisplay,
    input_source::spawn_stdin_source,
    network::TokioTransport,
    nonce::SeededNonceSource,
    storage::config::{config_path_from, load_config, ClientConfig, CONFIG_ENV_VAR},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from(std::env::var(CONFIG_ENV_VAR).ok(), std::env::args().skip(1));
    let config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        "thinview client starting (server {}:{}, view {})",
        config.endpoint.host,
        config.endpoint.port,
        config.view_size()
    );

    // ── Collaborators ─────────────────────────────────────────────────────────
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(TokioTransport::new(events_tx.clone()));
    let display = Arc::new(HeadlessDisplay::new(events_tx.clone(), config.display.refresh_hz));
    let nonce = Box::new(SeededNonceSource::from_time());

    let mut controller = ClientController::new(config.controller_config(), transport, display, nonce);
    controller.init().context("client initialisation failed")?;

    let _input = spawn_stdin_source(events_tx.clone());
    events_tx
        .send(ClientEvent::ViewChanged(config.view_size()))
        .context("event channel closed before start")?;

    // ── Event loop ────────────────────────────────────────────────────────────
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                controller.handle_event(event);

                if let Some(delay) = controller.take_retry_delay() {
                    let tx = events_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if tx.send(ClientEvent::RetryConnect).is_err() {
                            debug!("event loop gone; retry dropped");
                        }
                    });
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!(
        "thinview client stopped after {} frames",
        controller.pipeline().frames()
    );
    Ok(())
}
