//! HTTP surface for the detector.
//!
//! `api_router()` returns a composable `Router`; `server` binds it and
//! wires the Ollama-backed capabilities from configuration.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{build_context, load_rules, serve, StartupError};
pub use types::ApiContext;
