//! Graph Maker
//!
//! Entry point: set up the remote session, upload the dataset, then chat.

#![allow(clippy::manual_let_else)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::info;

use graph_maker::assistants::AssistantsClient;
use graph_maker::bridge::ToolCallBridge;
use graph_maker::chat::ChatSession;
use graph_maker::config::{AppConfig, load_api_credentials};
use graph_maker::dataset::upload_folder;
use graph_maker::executor::SubprocessExecutor;
use graph_maker::run::{RunDriver, TokioClock};
use graph_maker::session::{AgentProfile, SessionContext};
use graph_maker::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    telemetry::init();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let credentials = match load_api_credentials(&config.api.base_url) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    info!(
        base_url = %credentials.base_url,
        model = %config.api.model,
        dataset = %config.dataset.folder.display(),
        interpreter = %config.sandbox.interpreter,
        "Starting graph maker"
    );

    let client = Arc::new(AssistantsClient::new(&credentials).context("invalid API settings")?);

    let session =
        SessionContext::establish(client.as_ref(), &AgentProfile::from_config(&config.api)).await?;
    for link in session.debug_links() {
        println!("{link}");
    }

    let files = upload_folder(client.as_ref(), &session.assistant_id, &config.dataset.folder).await?;

    let executor = Arc::new(SubprocessExecutor::new(config.sandbox.clone()));
    let bridge = ToolCallBridge::new(executor, config.run.max_parallel_executions);
    let driver = RunDriver::new(client, bridge, Arc::new(TokioClock), config.run.clone());

    let chat = ChatSession::new(driver, session, files, config.dataset.clone());
    chat.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
