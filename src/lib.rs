//! commodity-ticker: simulated commodity price feed with a streaming chat desk
//!
//! This library provides:
//! - Instrument definitions with price bounds and display classes
//! - A subscribable ticker that perturbs prices on a repeating schedule
//! - Pluggable scheduling (tokio or manually advanced virtual time)
//! - A chat desk that streams replies from a hosted model
//! - Configuration, structured logging and Prometheus metrics

pub mod chat;
pub mod cli;
pub mod config;
pub mod instrument;
pub mod telemetry;
pub mod ticker;
