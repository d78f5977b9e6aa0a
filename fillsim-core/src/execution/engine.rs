//! The fill engine: the single entry point for order evaluation.
//!
//! The engine is immutable. It carries only configuration and the fee
//! model; all per-order state lives on the order and all market state on the
//! security. It is `Send + Sync`, so one engine can serve many securities
//! stepping in parallel.

use std::fmt;

use rust_decimal::Decimal;
use tracing::debug;

use super::config::FillConfig;
use super::fee::{FeeContext, FeeModel};
use super::strategy::{dispatch, FillContext, FillDecision};
use crate::domain::{FillResult, FillStatus, Order, OrderKind, OrderSide, TrailingType};
use crate::error::FillError;
use crate::market::{PriceSampler, Security};

pub struct FillEngine {
    config: FillConfig,
    fee_model: Box<dyn FeeModel>,
}

impl fmt::Debug for FillEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillEngine")
            .field("config", &self.config)
            .field("fee_model", &self.fee_model.name())
            .finish()
    }
}

impl Default for FillEngine {
    fn default() -> Self {
        Self::new(FillConfig::default())
    }
}

impl FillEngine {
    pub fn new(config: FillConfig) -> Self {
        Self {
            fee_model: config.fees.build(),
            config,
        }
    }

    /// Replace the configured fee model, e.g. with a closure.
    pub fn with_fee_model(mut self, fee_model: impl FeeModel + 'static) -> Self {
        self.fee_model = Box::new(fee_model);
        self
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    /// Evaluate one order against the security's current market state.
    ///
    /// Callable repeatedly: with no new data in between, a second call returns
    /// the same result and leaves the order's latched state unchanged.
    pub fn evaluate(
        &self,
        security: &Security,
        order: &mut Order,
    ) -> Result<FillResult, FillError> {
        let sampler = PriceSampler::for_security(security)?;
        let side = validate_order(security, order)?;
        let Some(now) = security.local_time() else {
            return Ok(FillResult::none(order.id, order.submitted_at));
        };
        if order.remaining_quantity().is_zero() {
            return Ok(FillResult::none(order.id, now));
        }

        let ctx = FillContext {
            security,
            sampler,
            now,
            gap_policy: self.config.gap_policy,
        };
        match dispatch(&ctx, order, side)? {
            Some(decision) => Ok(self.build_fill(order, decision)),
            None => Ok(FillResult::none(order.id, now)),
        }
    }

    /// Evaluate every order in input order, one result each.
    ///
    /// An error is local to its order; the rest of the batch is still
    /// evaluated.
    pub fn evaluate_all(
        &self,
        security: &Security,
        orders: &mut [Order],
    ) -> Vec<Result<FillResult, FillError>> {
        orders
            .iter_mut()
            .map(|order| self.evaluate(security, order))
            .collect()
    }

    fn build_fill(&self, order: &Order, decision: FillDecision) -> FillResult {
        let remaining = order.remaining_quantity();
        let (quantity, status) = match &self.config.liquidity {
            Some(policy) => {
                let (fill, rest) = policy.constrain(remaining.abs(), decision.volume);
                let signed = if remaining.is_sign_negative() { -fill } else { fill };
                let status = if rest.is_zero() {
                    FillStatus::Filled
                } else {
                    FillStatus::PartiallyFilled
                };
                (signed, status)
            }
            None => (remaining, FillStatus::Filled),
        };
        let fee = self.fee_model.fee(&FeeContext {
            order,
            quantity,
            price: decision.price,
            time: decision.time,
        });
        debug!(
            order_id = %order.id,
            kind = order.kind.name(),
            price = %decision.price,
            %quantity,
            ?status,
            "order filled"
        );
        FillResult {
            order_id: order.id,
            status,
            quantity,
            price: decision.price,
            fee,
            time: decision.time,
        }
    }
}

fn require_positive(order: &Order, value: Decimal, what: &str) -> Result<(), FillError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(FillError::invalid_order(
            order.id,
            format!("{what} must be positive, got {value}"),
        ))
    }
}

/// Check the order against the security and its own parameters.
///
/// `evaluate` runs this on every call; drivers can run it up front to turn
/// bad orders away at submission.
pub fn validate_order(security: &Security, order: &Order) -> Result<OrderSide, FillError> {
    if order.symbol != security.symbol {
        return Err(FillError::invalid_order(
            order.id,
            format!(
                "order for {} evaluated against {}",
                order.symbol, security.symbol
            ),
        ));
    }
    let side = order
        .side()
        .ok_or_else(|| FillError::invariant(order.id, "zero quantity order"))?;
    match order.kind {
        OrderKind::Market | OrderKind::MarketOnOpen | OrderKind::MarketOnClose => {}
        OrderKind::Limit { limit_price } => require_positive(order, limit_price, "limit price")?,
        OrderKind::StopMarket { stop_price } => require_positive(order, stop_price, "stop price")?,
        OrderKind::StopLimit {
            stop_price,
            limit_price,
        } => {
            require_positive(order, stop_price, "stop price")?;
            require_positive(order, limit_price, "limit price")?;
        }
        OrderKind::LimitIfTouched {
            trigger_price,
            limit_price,
        } => {
            require_positive(order, trigger_price, "trigger price")?;
            require_positive(order, limit_price, "limit price")?;
        }
        OrderKind::TrailingStop {
            stop_price,
            trailing_amount,
            trailing_type,
        } => {
            require_positive(order, stop_price, "stop price")?;
            require_positive(order, trailing_amount, "trailing amount")?;
            if trailing_type == TrailingType::Percentage && trailing_amount >= Decimal::ONE {
                return Err(FillError::invalid_order(
                    order.id,
                    format!("trailing percentage must be below 1, got {trailing_amount}"),
                ));
            }
        }
    }
    Ok(side)
}
