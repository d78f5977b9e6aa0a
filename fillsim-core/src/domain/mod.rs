//! Domain types: market observations, orders, fills and exchange hours.

pub mod bar;
pub mod fill;
pub mod hours;
pub mod observation;
pub mod order;
pub mod tick;

pub use bar::{Ohlc, QuoteBar, TradeBar};
pub use fill::{FillResult, FillStatus};
pub use hours::{ExchangeHours, SessionInterval, SessionWindow};
pub use observation::{DataShape, MarketObservation};
pub use order::{Order, OrderId, OrderKind, OrderSide, TrailingType, TriggerLatch};
pub use tick::{Tick, TickKind};
