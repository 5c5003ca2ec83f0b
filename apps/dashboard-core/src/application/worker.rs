//! Calculator Worker
//!
//! Runs the pure calculators from [`super::calculators`] on a dedicated task
//! reachable only through message passing. Each request carries a
//! caller-generated correlation id; the handle discards responses whose id is
//! not the most recently issued one, so overlapping calls resolve
//! last-response-wins.

use std::collections::HashMap;

use tokio::sync::mpsc;

use super::calculators::{
    AggregatedPrice, InvestmentReport, InvestmentRequest, PnlReport, PnlRequest, PriceQuote,
    aggregate_prices, calculate_investment, calculate_pnl,
};
use crate::domain::market::Symbol;

/// Depth of the request and response queues.
const CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// Messages
// =============================================================================

/// A calculation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcRequest {
    /// Reduce quotes to per-symbol mid/spread.
    AggregatePrices(Vec<PriceQuote>),
    /// Value balances and compute PnL.
    CalculatePnl(PnlRequest),
    /// Size a prospective order.
    CalculateInvestment(InvestmentRequest),
}

/// A calculation result, mirroring the request variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcResponse {
    /// Result of [`CalcRequest::AggregatePrices`].
    Prices(HashMap<Symbol, AggregatedPrice>),
    /// Result of [`CalcRequest::CalculatePnl`].
    Pnl(PnlReport),
    /// Result of [`CalcRequest::CalculateInvestment`].
    Investment(InvestmentReport),
}

#[derive(Debug)]
struct RequestEnvelope {
    id: u64,
    request: CalcRequest,
}

#[derive(Debug)]
struct ResponseEnvelope {
    id: u64,
    response: CalcResponse,
}

// =============================================================================
// Worker
// =============================================================================

/// Handle to the calculator worker task.
///
/// Dropping the handle closes the request queue and the worker exits.
#[derive(Debug)]
pub struct CalculatorHandle {
    request_tx: mpsc::Sender<RequestEnvelope>,
    response_rx: mpsc::Receiver<ResponseEnvelope>,
    next_id: u64,
}

/// Spawn the worker task and return its handle.
#[must_use]
pub fn spawn() -> CalculatorHandle {
    let (request_tx, mut request_rx) = mpsc::channel::<RequestEnvelope>(CHANNEL_CAPACITY);
    let (response_tx, response_rx) = mpsc::channel::<ResponseEnvelope>(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(envelope) = request_rx.recv().await {
            let response = evaluate(envelope.request);
            if response_tx
                .send(ResponseEnvelope {
                    id: envelope.id,
                    response,
                })
                .await
                .is_err()
            {
                break;
            }
        }
        tracing::debug!("calculator worker stopped");
    });

    CalculatorHandle {
        request_tx,
        response_rx,
        next_id: 0,
    }
}

/// Evaluate one request. Pure dispatch over the calculators.
fn evaluate(request: CalcRequest) -> CalcResponse {
    match request {
        CalcRequest::AggregatePrices(quotes) => CalcResponse::Prices(aggregate_prices(&quotes)),
        CalcRequest::CalculatePnl(request) => CalcResponse::Pnl(calculate_pnl(&request)),
        CalcRequest::CalculateInvestment(request) => {
            CalcResponse::Investment(calculate_investment(&request))
        }
    }
}

impl CalculatorHandle {
    /// Send one request and wait for its response.
    ///
    /// Responses belonging to earlier superseded calls are discarded while
    /// waiting. Returns `None` if the worker has stopped.
    pub async fn call(&mut self, request: CalcRequest) -> Option<CalcResponse> {
        self.next_id += 1;
        let id = self.next_id;

        self.request_tx
            .send(RequestEnvelope { id, request })
            .await
            .ok()?;

        while let Some(envelope) = self.response_rx.recv().await {
            if envelope.id == id {
                return Some(envelope.response);
            }
            tracing::trace!(
                stale_id = envelope.id,
                current_id = id,
                "discarding superseded calculator response"
            );
        }
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
