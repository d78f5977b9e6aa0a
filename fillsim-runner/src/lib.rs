//! fillsim runner: drives securities and their orders through time.
//!
//! This crate builds on `fillsim-core` to provide:
//! - A per-security driver that owns the market data cache and open orders
//! - A multi-security session stepped in parallel with Rayon
//! - TOML run configuration (fill settings plus securities)
//! - Tracing subscriber initialisation

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{HoursConfig, HoursPreset, RunConfig, RunConfigError, SecurityConfig};
pub use driver::{Rejection, SecurityDriver};
pub use error::SessionError;
pub use logging::{LogConfig, LogFormat};
pub use session::{Session, StepData};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<SecurityConfig>();
        assert_sync::<SecurityConfig>();
    }

    #[test]
    fn driver_is_send_sync() {
        assert_send::<SecurityDriver>();
        assert_sync::<SecurityDriver>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<SessionError>();
        assert_sync::<SessionError>();
        assert_send::<RunConfigError>();
        assert_sync::<RunConfigError>();
    }
}
