//! Per-security simulation driver.
//!
//! The driver owns one security (hours plus market data cache) and its open
//! orders. Each step advances local time, ingests the step's observations,
//! evaluates every open order and books the resulting fills. Orders leave
//! the book when fully filled, cancelled or rejected.

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use fillsim_core::domain::{FillResult, MarketObservation, Order, OrderId};
use fillsim_core::execution::validate_order;
use fillsim_core::market::Security;
use fillsim_core::{FillEngine, FillError};

use crate::error::SessionError;

/// An order pulled from the book because evaluating it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub order: Order,
    pub error: FillError,
}

#[derive(Debug, Clone)]
pub struct SecurityDriver {
    security: Security,
    open: Vec<Order>,
    fills: Vec<FillResult>,
    rejected: Vec<Rejection>,
}

impl SecurityDriver {
    pub fn new(security: Security) -> Self {
        Self {
            security,
            open: Vec::new(),
            fills: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.security.symbol
    }

    pub fn security(&self) -> &Security {
        &self.security
    }

    /// Orders still resting, in submission order.
    pub fn open_orders(&self) -> &[Order] {
        &self.open
    }

    /// Every fill booked so far, in the order it happened.
    pub fn fills(&self) -> &[FillResult] {
        &self.fills
    }

    /// Orders retired because their evaluation failed.
    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    pub fn submit(&mut self, order: Order) -> Result<(), SessionError> {
        if order.symbol != self.security.symbol {
            return Err(SessionError::SymbolMismatch {
                order_id: order.id,
                order_symbol: order.symbol,
                symbol: self.security.symbol.clone(),
            });
        }
        if self.open.iter().any(|o| o.id == order.id) {
            return Err(SessionError::DuplicateOrder(order.id));
        }
        validate_order(&self.security, &order)?;
        debug!(
            symbol = %self.security.symbol,
            order_id = %order.id,
            kind = order.kind.name(),
            "order submitted"
        );
        self.open.push(order);
        Ok(())
    }

    /// Remove an open order. Returns it, or `None` if it is not resting.
    pub fn cancel(&mut self, id: OrderId) -> Option<Order> {
        let index = self.open.iter().position(|o| o.id == id)?;
        debug!(symbol = %self.security.symbol, order_id = %id, "order cancelled");
        Some(self.open.remove(index))
    }

    /// Advance to `now`, ingest `observations`, evaluate all open orders.
    ///
    /// Returns the fills booked during this step. An order whose evaluation
    /// fails is retired to `rejected` without holding up the others.
    pub fn step(
        &mut self,
        engine: &FillEngine,
        now: DateTime<Utc>,
        observations: impl IntoIterator<Item = MarketObservation>,
    ) -> Vec<FillResult> {
        self.security.state_mut().advance_to(now);
        for observation in observations {
            if !self.security.state_mut().update(observation) {
                trace!(symbol = %self.security.symbol, "observation dropped");
            }
        }

        let results = engine.evaluate_all(&self.security, &mut self.open);
        let mut booked = Vec::new();
        let mut failed = Vec::new();
        for (index, (order, result)) in self.open.iter_mut().zip(results).enumerate() {
            let outcome = result.and_then(|fill| {
                if fill.is_fill() {
                    order.record_fill(&fill)?;
                    booked.push(fill);
                }
                Ok(())
            });
            if let Err(error) = outcome {
                warn!(
                    symbol = %self.security.symbol,
                    order_id = %order.id,
                    %error,
                    "order rejected"
                );
                failed.push((index, error));
            }
        }
        let mut retired = Vec::with_capacity(failed.len());
        for (index, error) in failed.into_iter().rev() {
            let order = self.open.remove(index);
            retired.push(Rejection { order, error });
        }
        self.rejected.extend(retired.into_iter().rev());
        self.open.retain(|order| !order.is_filled());
        self.fills.extend(booked.iter().cloned());
        booked
    }

    /// Cancel everything and forget all market data.
    pub fn shut_down(&mut self) -> Vec<Order> {
        self.security.state_mut().clear();
        std::mem::take(&mut self.open)
    }
}
