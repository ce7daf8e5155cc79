//! chatrelay – a minimal broadcast chat relay over TCP.
//!
//! This crate exports
//!  * `core`   – chat message model, wire codec, connection registry
//!  * `relay`  – TCP server engine and fan-out dispatcher
//!  * `config` – TOML-driven runtime configuration
//!
//! Downstream applications can embed the relay engine (`start_relay`) or
//! build their own binaries on top of the library.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;
pub mod relay;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use config::{load_config, Config};
pub use relay::server::serve as start_relay;
