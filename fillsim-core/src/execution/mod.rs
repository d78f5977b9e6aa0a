//! Execution: turns open orders plus the latest market data into fills.
//!
//! Key pieces:
//! - **Intrabar path**: assumed order of a bar's extremes
//! - **Walk**: trigger-then-limit search along a bar path or a tick sequence
//! - **Touch latch**: monotonic per-order trigger state
//! - **Gap policy**: stop fills when a bar opens beyond the trigger
//! - **Liquidity**: optional participation cap
//! - **Fees**: pluggable fee model, result passed through unchanged

pub mod config;
pub mod engine;
pub mod fee;
pub mod gap;
pub mod liquidity;
pub mod path;
mod strategy;
pub mod touch;
pub mod walk;

pub use config::{ConfigError, FillConfig, FillPreset};
pub use engine::{validate_order, FillEngine};
pub use fee::{BpsFee, FeeConfig, FeeContext, FeeModel, NoFee, PerUnitFee};
pub use gap::GapPolicy;
pub use liquidity::LiquidityPolicy;
pub use path::IntrabarPath;
pub use touch::{is_touched, mark_touched, prior_touch};
