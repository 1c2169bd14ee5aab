//! Literary Assistant · chat backend
//!
//! - Axum HTTP + WebSocket API
//! - SQLite per-user dictionary
//! - Optional chat-completions integration (via environment variables)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   DATABASE_PATH      : SQLite file (default "literary_bot.db")
//!   ADMIN_USER_ID      : user id allowed to run /admin
//!   LLM_API_KEY        : enables the generator if present (fallback: OPENROUTER_API_KEY)
//!   LLM_BASE_URL       : default "https://openrouter.ai/api/v1"
//!   LLM_MODEL          : default "deepseek/deepseek-chat"
//!   AGENT_CONFIG_PATH  : path to TOML config (prompts, limits, sources, extra glossary)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use literary_assistant::routes::build_router;
use literary_assistant::state::AppState;
use literary_assistant::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (dictionary store, sessions, glossary, generator client).
  let state = Arc::new(AppState::new()?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "literary_assistant", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "literary_assistant", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "literary_assistant", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "literary_assistant", "Shutdown signal received");
}
