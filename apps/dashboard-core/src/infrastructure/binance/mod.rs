//! Exchange Adapters
//!
//! Everything that talks Binance's wire formats: the multiplexed WebSocket
//! session, the frame router, the signed REST client, and request signing.

pub mod messages;
pub mod rest;
pub mod router;
pub mod session;
pub mod signing;

pub use rest::{AccountInfo, BinanceRestClient, OrderHistoryQuery, RestError};
pub use router::{RouteError, RoutedEvent, route};
pub use session::{ConnectionState, MarketSession, SessionError, SessionEvent};
pub use signing::{QueryParams, SigningError};
