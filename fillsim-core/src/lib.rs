//! fillsim core: order fill simulation against historical or live market data.
//!
//! Given the freshest observations for a security and an order's
//! parameters, the engine decides trigger state, fill price, fill quantity
//! and status:
//! - Domain types (bars, ticks, orders, fills, exchange hours)
//! - Per-security observation cache and price sampler
//! - Intrabar path convention and trigger/limit path walking
//! - Per-family fill strategies behind one `FillEngine`

pub mod domain;
pub mod error;
pub mod execution;
pub mod market;

pub use error::FillError;
pub use execution::{FillConfig, FillEngine};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a parallel driver moves across threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::FillResult>();
        require_sync::<domain::FillResult>();
        require_send::<domain::MarketObservation>();
        require_sync::<domain::MarketObservation>();
        require_send::<domain::ExchangeHours>();
        require_sync::<domain::ExchangeHours>();

        // Market state
        require_send::<market::Security>();
        require_sync::<market::Security>();
        require_send::<market::SecurityMarketState>();
        require_sync::<market::SecurityMarketState>();

        // Engine
        require_send::<execution::FillEngine>();
        require_sync::<execution::FillEngine>();
        require_send::<execution::FillConfig>();
        require_sync::<execution::FillConfig>();

        // Evaluation reads the security through a shared reference and can
        // only mutate the order it was handed.
        let _: fn(&FillEngine, &market::Security, &mut domain::Order) -> Result<_, FillError> =
            FillEngine::evaluate;
    }
}
