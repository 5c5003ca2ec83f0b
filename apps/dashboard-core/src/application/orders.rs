//! Order Submission Gateway
//!
//! Validates a prospective order against the latest balance snapshot before
//! anything touches the network, then submits it and returns the exchange's
//! record verbatim. A validation failure is immediate and performs no REST
//! call.
//!
//! The gateway does not reconcile balances after a fill; callers re-trigger
//! the snapshot poller instead.

use rust_decimal::Decimal;

use crate::domain::account::{
    AccountBalance, NewOrder, OrderRecord, OrderSide, OrderType, TimeInForce,
};
use crate::domain::market::Symbol;
use crate::infrastructure::binance::{BinanceRestClient, RestError};

// =============================================================================
// Request and Errors
// =============================================================================

/// A prospective order as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Trading pair.
    pub symbol: Symbol,
    /// Order direction.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Base-asset quantity.
    pub quantity: Decimal,
    /// Limit price; required iff the order is a limit order.
    pub price: Option<Decimal>,
}

/// Client-side validation failures. All fail fast with no network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Quantity must be strictly positive.
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    /// Limit orders need a price.
    #[error("limit orders require a price")]
    MissingLimitPrice,

    /// Market buys need a reference price to estimate cost.
    #[error("no reference price available to validate a market buy")]
    MissingReferencePrice,

    /// Quote balance does not cover the estimated cost.
    #[error("insufficient {asset} balance: need {required}, have {available}")]
    InsufficientQuote {
        /// Quote asset code.
        asset: String,
        /// Estimated cost at the effective price.
        required: Decimal,
        /// Available free amount.
        available: Decimal,
    },

    /// Base balance does not cover the quantity to sell.
    #[error("insufficient {asset} balance: need {required}, have {available}")]
    InsufficientBase {
        /// Base asset code.
        asset: String,
        /// Requested quantity.
        required: Decimal,
        /// Available free amount.
        available: Decimal,
    },
}

/// Errors from order submission.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Rejected client-side; no network call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The exchange rejected or the request failed in transit.
    #[error(transparent)]
    Rest(#[from] RestError),
}

// =============================================================================
// Gateway
// =============================================================================

/// Validates and submits orders through one REST client.
#[derive(Debug, Clone)]
pub struct OrderGateway {
    client: BinanceRestClient,
}

impl OrderGateway {
    /// Create a gateway over the given client.
    #[must_use]
    pub const fn new(client: BinanceRestClient) -> Self {
        Self { client }
    }

    /// Validate and submit one order.
    ///
    /// `reference_price` is the caller's current mid price, used to estimate
    /// the cost of a market buy; the exchange remains the arbiter of the
    /// actual fill price.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Validation`] before any network call when a
    /// precondition fails, or [`OrderError::Rest`] when the exchange rejects
    /// the order or the request fails.
    pub async fn submit(
        &self,
        request: OrderRequest,
        balances: &[AccountBalance],
        reference_price: Option<Decimal>,
    ) -> Result<OrderRecord, OrderError> {
        let order = validate(&request, balances, reference_price)?;
        let record = self.client.place_order(&order).await?;
        tracing::info!(
            symbol = %request.symbol,
            side = %request.side,
            order_id = record.order_id,
            "order accepted"
        );
        Ok(record)
    }
}

/// Enforce the client-side preconditions and build the wire order.
///
/// # Errors
///
/// Returns [`ValidationError`] when a precondition fails.
pub fn validate(
    request: &OrderRequest,
    balances: &[AccountBalance],
    reference_price: Option<Decimal>,
) -> Result<NewOrder, ValidationError> {
    if request.quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity);
    }

    let price = match request.order_type {
        OrderType::Limit => Some(request.price.ok_or(ValidationError::MissingLimitPrice)?),
        OrderType::Market => None,
    };

    match request.side {
        OrderSide::Buy => {
            // Limit buys cost quantity x limit price; market buys are
            // estimated at the caller's reference price.
            let effective_price = match price {
                Some(limit) => limit,
                None => reference_price.ok_or(ValidationError::MissingReferencePrice)?,
            };
            let required = request.quantity * effective_price;
            let available = free_amount(balances, request.symbol.quote_asset());
            if required > available {
                return Err(ValidationError::InsufficientQuote {
                    asset: request.symbol.quote_asset().to_string(),
                    required,
                    available,
                });
            }
        }
        OrderSide::Sell => {
            let available = free_amount(balances, request.symbol.base_asset());
            if request.quantity > available {
                return Err(ValidationError::InsufficientBase {
                    asset: request.symbol.base_asset().to_string(),
                    required: request.quantity,
                    available,
                });
            }
        }
    }

    Ok(NewOrder {
        symbol: request.symbol,
        side: request.side,
        order_type: request.order_type,
        quantity: request.quantity,
        price,
        // Limit orders always rest as good-till-cancelled.
        time_in_force: match request.order_type {
            OrderType::Limit => Some(TimeInForce::Gtc),
            OrderType::Market => None,
        },
        new_client_order_id: None,
    })
}

fn free_amount(balances: &[AccountBalance], asset: &str) -> Decimal {
    balances
        .iter()
        .find(|balance| balance.asset == asset)
        .map(AccountBalance::free_amount)
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
