//! Domain layer - Core market data and account types with no I/O dependencies.

/// Market data types and bounded per-symbol buffers.
pub mod market;

/// Account balance and order mirror types.
pub mod account;
