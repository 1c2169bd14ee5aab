//! Literary Assistant: explains archaic and literary vocabulary, quotations and characters,
//! retells passages in modern language, keeps a per-user dictionary and runs a small quiz.

pub mod config;
pub mod domain;
pub mod explain;
pub mod glossary;
pub mod llm;
pub mod logic;
pub mod protocol;
pub mod quiz;
pub mod quiz_text;
pub mod routes;
pub mod seeds;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
