//! Thin wrapper around a hosted chat-completion model, plus the fixed agent personas.

pub mod agents;
pub mod client;

pub use agents::Agent;
pub use client::{extract_json, AiClient, Completion};
