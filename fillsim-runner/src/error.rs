//! Errors raised while driving securities through a session.

use fillsim_core::domain::OrderId;
use fillsim_core::FillError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("security {0} is already part of the session")]
    DuplicateSecurity(String),

    #[error("no security {0} in the session")]
    UnknownSecurity(String),

    #[error("order {order_id} is for {order_symbol}, driver handles {symbol}")]
    SymbolMismatch {
        order_id: OrderId,
        order_symbol: String,
        symbol: String,
    },

    #[error("order {0} is already open")]
    DuplicateOrder(OrderId),

    #[error(transparent)]
    Fill(#[from] FillError),
}
