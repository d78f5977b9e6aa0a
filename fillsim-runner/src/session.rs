//! Multi-security session.
//!
//! Securities never share state, so a step evaluates them in parallel with
//! Rayon. Results are returned in symbol order either way, which keeps a
//! parallel run identical to a sequential one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::info;

use fillsim_core::domain::{FillResult, MarketObservation, Order, OrderId};
use fillsim_core::market::Security;
use fillsim_core::FillEngine;

use crate::config::RunConfig;
use crate::driver::SecurityDriver;
use crate::error::SessionError;

/// Observations for one step, keyed by symbol.
pub type StepData = BTreeMap<String, Vec<MarketObservation>>;

#[derive(Debug)]
pub struct Session {
    engine: FillEngine,
    drivers: BTreeMap<String, SecurityDriver>,
    parallel: bool,
}

impl Session {
    pub fn new(engine: FillEngine) -> Self {
        Self {
            engine,
            drivers: BTreeMap::new(),
            parallel: true,
        }
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, SessionError> {
        let mut session = Self::new(FillEngine::new(config.fill_config()));
        for security in &config.securities {
            session.add_security(security.build())?;
        }
        Ok(session)
    }

    /// Enable or disable parallel stepping (enabled by default).
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn engine(&self) -> &FillEngine {
        &self.engine
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    pub fn driver(&self, symbol: &str) -> Option<&SecurityDriver> {
        self.drivers.get(symbol)
    }

    pub fn add_security(&mut self, security: Security) -> Result<(), SessionError> {
        if self.drivers.contains_key(&security.symbol) {
            return Err(SessionError::DuplicateSecurity(security.symbol));
        }
        info!(symbol = %security.symbol, "security added");
        self.drivers
            .insert(security.symbol.clone(), SecurityDriver::new(security));
        Ok(())
    }

    /// Drop a security, clearing its cache. Returns its cancelled open orders.
    pub fn remove_security(&mut self, symbol: &str) -> Result<Vec<Order>, SessionError> {
        let mut driver = self
            .drivers
            .remove(symbol)
            .ok_or_else(|| SessionError::UnknownSecurity(symbol.to_string()))?;
        let cancelled = driver.shut_down();
        info!(symbol, cancelled = cancelled.len(), "security removed");
        Ok(cancelled)
    }

    pub fn submit(&mut self, order: Order) -> Result<(), SessionError> {
        self.drivers
            .get_mut(&order.symbol)
            .ok_or_else(|| SessionError::UnknownSecurity(order.symbol.clone()))?
            .submit(order)
    }

    pub fn cancel(&mut self, symbol: &str, id: OrderId) -> Result<Option<Order>, SessionError> {
        let driver = self
            .drivers
            .get_mut(symbol)
            .ok_or_else(|| SessionError::UnknownSecurity(symbol.to_string()))?;
        Ok(driver.cancel(id))
    }

    /// Advance every security to `now` and evaluate its orders.
    ///
    /// Securities without data in `data` still advance, so their cached
    /// observations age and go stale. Data for an unknown symbol is an
    /// error and nothing is stepped. Orders that fail evaluation are retired
    /// into their driver's `rejected` list; every other result is returned.
    pub fn step(
        &mut self,
        now: DateTime<Utc>,
        data: &StepData,
    ) -> Result<Vec<FillResult>, SessionError> {
        if let Some(symbol) = data.keys().find(|s| !self.drivers.contains_key(*s)) {
            return Err(SessionError::UnknownSecurity(symbol.clone()));
        }

        let engine = &self.engine;
        let step_one = |(symbol, driver): (&String, &mut SecurityDriver)| {
            let observations = data.get(symbol).into_iter().flatten().cloned();
            driver.step(engine, now, observations)
        };
        let per_security: Vec<Vec<FillResult>> = if self.parallel {
            self.drivers.par_iter_mut().map(step_one).collect()
        } else {
            self.drivers.iter_mut().map(step_one).collect()
        };
        Ok(per_security.into_iter().flatten().collect())
    }
}
