//! Errors surfaced by fill evaluation.
//!
//! Only configuration problems and broken contracts are errors. An order
//! that simply cannot fill yet is reported as a `FillResult` with
//! `FillStatus::None`.

use crate::domain::OrderId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// The security has no exchange hours, so there is no local time zone
    /// to evaluate against.
    #[error("security {symbol} has no exchange time reference configured")]
    MissingTimeReference { symbol: String },

    /// Order parameters the engine cannot evaluate.
    #[error("order {order_id} is invalid: {reason}")]
    InvalidOrder { order_id: OrderId, reason: String },

    /// A programming-contract failure. Never corrected silently.
    #[error("invariant violated for order {order_id}: {reason}")]
    InvariantViolation { order_id: OrderId, reason: String },
}

impl FillError {
    pub fn invalid_order(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            order_id,
            reason: reason.into(),
        }
    }

    pub fn invariant(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            order_id,
            reason: reason.into(),
        }
    }

    /// Configuration errors are fatal to the evaluation call and are not
    /// retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingTimeReference { .. } | Self::InvalidOrder { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_configuration_errors() {
        let missing = FillError::MissingTimeReference {
            symbol: "SPY".into(),
        };
        assert!(missing.is_configuration());
        assert!(FillError::invalid_order(OrderId(1), "bad").is_configuration());
        assert!(!FillError::invariant(OrderId(1), "sign").is_configuration());
    }

    #[test]
    fn messages_name_the_subject() {
        let err = FillError::invariant(OrderId(7), "fill sign does not match order");
        assert_eq!(
            err.to_string(),
            "invariant violated for order 7: fill sign does not match order"
        );
    }
}
