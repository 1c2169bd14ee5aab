//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,dialog=debug,store=debug,literary_assistant=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used across the crate:
//!   - `literary_assistant` : startup, transport, generator client
//!   - `dialog`             : conversation routing and intent handlers
//!   - `store`              : dictionary persistence
//!   - `quiz`               : quiz generation and grading

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str =
  "info,literary_assistant=debug,dialog=debug,store=info,quiz=debug,tower_http=info,axum=info";

pub fn init_tracing() {
  let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  // Choose JSON vs pretty; don't try to store different layer types.
  match std::env::var("LOG_FORMAT").as_deref() {
    Ok("json") => {
      builder.json().init();
    }
    _ => {
      builder.init();
    }
  }
}
