//! Application Layer - Use cases over the domain and adapters.
//!
//! The snapshot poller, order gateway, and offloaded calculators. These
//! orchestrate the infrastructure adapters without knowing wire formats.

/// Pure calculators (price aggregation, PnL, investment sizing).
pub mod calculators;

/// Order validation and submission.
pub mod orders;

/// Periodic account snapshot fetching.
pub mod snapshot;

/// Message-passing worker running the calculators.
pub mod worker;

pub use orders::{OrderError, OrderGateway, OrderRequest, ValidationError};
pub use snapshot::{AccountSnapshot, SnapshotPoller};
pub use worker::{CalcRequest, CalcResponse, CalculatorHandle};
