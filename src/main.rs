//! HomeFlow plugin entry point
//!
//! Exposes smart-home scenes and EV/UAV mobility actions to an assistant
//! host over a `<<END>>`-framed JSON stream on stdin/stdout, executing them
//! through IFTTT Webhooks. Logs go to stderr: stdout belongs to the
//! protocol.

mod command;
mod config;
mod ifttt;
mod registry;
mod session;

use command::Router;
use config::PluginConfig;
use ifttt::IftttClient;
use session::Session;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("HomeFlow plugin starting up");

    let config_path = config::default_path();
    let config = PluginConfig::load(&config_path);
    info!(
        "Configured: {} scenes, {} mobility actions, api key {}",
        config.scenes.len(),
        config.mobility_actions.len(),
        if config.api_key().is_empty() {
            "absent"
        } else {
            "present"
        }
    );

    let trigger = Arc::new(IftttClient::new(&config));
    let router = Router::new(&config, trigger);

    let mut session = Session::new(router, tokio::io::stdin(), tokio::io::stdout());
    if let Err(e) = session.run().await {
        error!("Session ended with error: {:#}", e);
    }

    info!("HomeFlow plugin exiting");
}
