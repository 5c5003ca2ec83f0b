//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete adapters for the exchange's wire formats, configuration,
//! durable storage, and logging.

/// Binance WebSocket and REST adapters.
pub mod binance;

/// Environment-driven configuration.
pub mod config;

/// File-backed trade mirror and credential store.
pub mod persistence;

/// Tracing subscriber setup.
pub mod telemetry;
