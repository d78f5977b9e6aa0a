//! Market data side: the per-security observation cache and the sampler
//! that turns it into a usable price source.

pub mod cache;
pub mod sampler;
pub mod security;

pub use cache::SecurityMarketState;
pub use sampler::{
    Affinity, BarSample, PriceSampler, PriceSource, SampleRequest, TickPoint, TickWalk,
};
pub use security::Security;
