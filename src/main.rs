use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use email_rag_agent::core::config::{load_dotenv, ConfigService};
use email_rag_agent::logging;
use email_rag_agent::server;
use email_rag_agent::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv().context("Failed to load .env file")?;
    let settings = ConfigService::from_env()
        .load()
        .context("Failed to load configuration")?;
    logging::init(settings.log_dir.as_deref(), "email-rag-server");

    let bind_addr = settings.bind_addr();
    let state = AppState::initialize(settings).await;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!(kb_status = state.kb_status().label(), "Listening on http://{}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
