#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tick-filter engine (host-agnostic).
//!
//! Derives a smoothed or aggregated output from one noisy, irregularly
//! sampled numeric input stream, and keeps that output fresh when the input
//! goes quiet. All host interactions go through the `tickfilter_traits`
//! `Source`/`Sink` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: time-weighted average, adaptive low-pass, time integrator
//!   (`filter` module)
//! - **Scheduling**: dual-trigger event/fallback logic (`scheduler` module)
//! - **Units**: output-unit adoption and scale factors (`units` module)
//! - **Projection**: rounding and attribute exposure (`output` module)
//! - **Runner**: serialized two-channel update loop (`runner` module)
//!
//! All filter math runs on `f64` with timestamps in wall-clock seconds.

// Module declarations
pub mod error;
pub mod filter;
pub mod mocks;
pub mod output;
pub mod runner;
pub mod scheduler;
pub mod units;
pub mod util;

use crate::error::{BuildError, Result};
use crate::filter::{Filter, Integrator, LowPass, Method, TimeSma};
use crate::output::OutputProjector;
use crate::scheduler::UpdateScheduler;
use crate::units::UnitConverter;
use std::marker::PhantomData;
use tickfilter_traits::{Attributes, SourceEvent, StateUpdate};

/// One assembled filter instance: scheduler, projector, and identity.
pub struct TickFilter {
    name: String,
    unique_id: Option<String>,
    scheduler: UpdateScheduler,
    projector: OutputProjector,
}

impl core::fmt::Debug for TickFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickFilter")
            .field("name", &self.name)
            .field("value", &self.scheduler.value())
            .finish()
    }
}

impl TickFilter {
    /// Start building a TickFilter.
    pub fn builder() -> TickFilterBuilder<Missing, Missing> {
        TickFilterBuilder::default()
    }

    /// Build directly from a validated config table. `now_s` becomes the
    /// epoch for elapsed-time measurement.
    pub fn from_config(cfg: &tickfilter_config::SensorCfg, now_s: f64) -> Result<Self> {
        let mut b = Self::builder()
            .with_source(&cfg.source)
            .with_method(cfg.method.into())
            .with_epoch_s(now_s)
            .with_update_s(cfg.update_s)
            .with_window_s(cfg.window_s)
            .with_tau_s(cfg.tau_s)
            .with_force_update(cfg.force_update);
        if let Some(name) = &cfg.name {
            b = b.with_name(name);
        }
        if let Some(id) = &cfg.unique_id {
            b = b.with_unique_id(id);
        }
        if let Some(places) = cfg.round {
            b = b.with_round(places);
        }
        if let Some(unit) = &cfg.unit_of_measurement {
            b = b.with_output_unit(unit);
        }
        b.build()
    }

    /// Event trigger: a genuine source state change at `now_s`.
    pub fn handle_event(&mut self, now_s: f64, event: &SourceEvent) -> Option<StateUpdate> {
        self.scheduler
            .handle_event(now_s, event)
            .map(|y| self.projector.project(y, self.scheduler.units()))
    }

    /// Fallback trigger: one periodic tick at `now_s`.
    pub fn handle_tick(&mut self, now_s: f64) -> Option<StateUpdate> {
        self.scheduler
            .handle_tick(now_s)
            .map(|y| self.projector.project(y, self.scheduler.units()))
    }

    /// Seed the estimate from a persisted value. Only meaningful before the
    /// first trigger of either path.
    pub fn restore_value(&mut self, y: f64) {
        self.scheduler.restore(y);
    }

    /// Current raw (unrounded) estimate.
    pub fn value(&self) -> f64 {
        self.scheduler.value()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn update_s(&self) -> f64 {
        self.scheduler.update_s()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `TickFilter`. All parameters are validated on `build()`.
pub struct TickFilterBuilder<S, M> {
    source: Option<String>,
    method: Option<Method>,
    name: Option<String>,
    unique_id: Option<String>,
    update_s: f64,
    window_s: f64,
    tau_s: f64,
    force_update: bool,
    round: Option<i32>,
    output_unit: Option<String>,
    restored: Option<f64>,
    /// Wall-clock seconds of construction; elapsed time for the first tick
    /// is measured from here.
    epoch_s: f64,
    // Type-state markers
    _s: PhantomData<S>,
    _m: PhantomData<M>,
}

impl Default for TickFilterBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            source: None,
            method: None,
            name: None,
            unique_id: None,
            update_s: 30.0,
            window_s: 60.0,
            tau_s: 30.0,
            force_update: true,
            round: None,
            output_unit: None,
            restored: None,
            epoch_s: 0.0,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<S, M> TickFilterBuilder<S, M> {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }
    pub fn with_unique_id(mut self, id: &str) -> Self {
        self.unique_id = Some(id.to_owned());
        self
    }
    pub fn with_update_s(mut self, update_s: f64) -> Self {
        self.update_s = update_s;
        self
    }
    pub fn with_window_s(mut self, window_s: f64) -> Self {
        self.window_s = window_s;
        self
    }
    pub fn with_tau_s(mut self, tau_s: f64) -> Self {
        self.tau_s = tau_s;
        self
    }
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }
    pub fn with_round(mut self, places: i32) -> Self {
        self.round = Some(places);
        self
    }
    pub fn with_output_unit(mut self, unit: &str) -> Self {
        self.output_unit = Some(unit.to_owned());
        self
    }
    /// Seed the estimate from a previously persisted value.
    pub fn with_restored_value(mut self, y: f64) -> Self {
        self.restored = Some(y);
        self
    }
    /// Wall-clock seconds at construction time; defaults to 0.0.
    pub fn with_epoch_s(mut self, epoch_s: f64) -> Self {
        self.epoch_s = epoch_s;
        self
    }

    /// Fallible build available in any type-state; returns a typed
    /// BuildError for missing or out-of-range pieces.
    pub fn try_build(self) -> Result<TickFilter> {
        let TickFilterBuilder {
            source,
            method,
            name,
            unique_id,
            update_s,
            window_s,
            tau_s,
            force_update,
            round,
            output_unit,
            restored,
            epoch_s,
            _s: _,
            _m: _,
        } = self;

        let source = source.ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        let method = method.ok_or_else(|| eyre::Report::new(BuildError::MissingMethod))?;

        if source.trim().is_empty() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "source must not be empty",
            )));
        }
        if !update_s.is_finite() || update_s < 1.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "update_s must be >= 1",
            )));
        }
        if !window_s.is_finite() || window_s < 1.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "window_s must be >= 1",
            )));
        }
        if !tau_s.is_finite() || tau_s < 0.001 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tau_s must be >= 0.001",
            )));
        }
        if let Some(places) = round
            && !(-12..=12).contains(&places)
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "round must be in [-12, 12]",
            )));
        }
        if restored.is_some_and(|y| !y.is_finite()) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "restored value must be finite",
            )));
        }

        let filter = match method {
            Method::TimeSma => Filter::TimeSma(TimeSma::new(window_s)),
            Method::LowPass => Filter::LowPass(LowPass::new(tau_s)),
            Method::Integrator => Filter::Integrator(Integrator::new()),
        };
        let units = UnitConverter::new(method, output_unit);
        let mut scheduler = UpdateScheduler::new(filter, units, update_s, epoch_s);
        if let Some(y) = restored {
            scheduler.restore(y);
        }

        let attributes = Attributes {
            source: source.clone(),
            method: method.as_str(),
            update_s,
            window_s: (method == Method::TimeSma).then_some(window_s),
            tau_s: (method == Method::LowPass).then_some(tau_s),
        };
        let projector = OutputProjector::new(round, force_update, attributes);
        let name = name.unwrap_or_else(|| format!("{} of {}", method.as_str(), source));

        Ok(TickFilter {
            name,
            unique_id,
            scheduler,
            projector,
        })
    }
}

// Setters that advance type-state when providing mandatory parameters
impl<M> TickFilterBuilder<Missing, M> {
    pub fn with_source(self, source: &str) -> TickFilterBuilder<Set, M> {
        let TickFilterBuilder {
            source: _,
            method,
            name,
            unique_id,
            update_s,
            window_s,
            tau_s,
            force_update,
            round,
            output_unit,
            restored,
            epoch_s,
            _s: _,
            _m: _,
        } = self;
        TickFilterBuilder {
            source: Some(source.to_owned()),
            method,
            name,
            unique_id,
            update_s,
            window_s,
            tau_s,
            force_update,
            round,
            output_unit,
            restored,
            epoch_s,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<S> TickFilterBuilder<S, Missing> {
    pub fn with_method(self, method: Method) -> TickFilterBuilder<S, Set> {
        let TickFilterBuilder {
            source,
            method: _,
            name,
            unique_id,
            update_s,
            window_s,
            tau_s,
            force_update,
            round,
            output_unit,
            restored,
            epoch_s,
            _s: _,
            _m: _,
        } = self;
        TickFilterBuilder {
            source,
            method: Some(method),
            name,
            unique_id,
            update_s,
            window_s,
            tau_s,
            force_update,
            round,
            output_unit,
            restored,
            epoch_s,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

impl TickFilterBuilder<Set, Set> {
    /// Validate and build. Only available once source and method are set.
    pub fn build(self) -> Result<TickFilter> {
        self.try_build()
    }
}
