use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStatus {
    None,
    PartiallyFilled,
    Filled,
}

/// Outcome of one evaluation of one order.
///
/// Produced fresh on every call. `quantity` carries the order's sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResult {
    pub order_id: OrderId,
    pub status: FillStatus,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub time: DateTime<Utc>,
}

impl FillResult {
    pub fn none(order_id: OrderId, time: DateTime<Utc>) -> Self {
        Self {
            order_id,
            status: FillStatus::None,
            quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            fee: Decimal::ZERO,
            time,
        }
    }

    pub fn is_fill(&self) -> bool {
        self.status != FillStatus::None
    }
}
