//! Dual-trigger update scheduling.
//!
//! Two trigger paths feed the filter: the event path, invoked for every
//! genuine source state change, and the fallback path, invoked on a periodic
//! cadence to keep the output fresh during input silence. Both funnel through
//! the single `apply` mutation point, so `dt` and the last-update bookkeeping
//! cannot diverge between paths. The fallback path only ever re-feeds the
//! last genuinely observed input; it never fabricates one.
//!
//! All timestamps are wall-clock seconds as `f64`; the scheduler itself holds
//! no clock, which keeps every test fully deterministic.

use crate::filter::{Filter, Method};
use crate::units::UnitConverter;
use tickfilter_traits::SourceEvent;

#[derive(Debug)]
pub struct UpdateScheduler {
    filter: Filter,
    units: UnitConverter,
    /// Nominal update period; fallback ticks younger than this since the last
    /// genuine event are suppressed.
    update_s: f64,
    last_update_s: f64,
    last_source_event_s: Option<f64>,
    /// Last raw input consumed (post unit scaling), re-fed on fallback ticks.
    last_x: Option<f64>,
}

impl UpdateScheduler {
    pub fn new(filter: Filter, units: UnitConverter, update_s: f64, now_s: f64) -> Self {
        Self {
            filter,
            units,
            update_s,
            last_update_s: now_s,
            last_source_event_s: None,
            last_x: None,
        }
    }

    /// Event trigger. Returns the new estimate when a tick happened.
    ///
    /// The event time is recorded and the unit scale resolved before parsing,
    /// so unit adoption happens even for events that fail to parse. A parse
    /// failure falls back to the previous input; with no previous input the
    /// tick is skipped entirely.
    pub fn handle_event(&mut self, now_s: f64, event: &SourceEvent) -> Option<f64> {
        self.last_source_event_s = Some(now_s);
        let scale = self.units.resolve(event);
        let x = match event.state.trim().parse::<f64>() {
            Ok(v) => Some(v / scale),
            Err(_) => {
                tracing::warn!(state = %event.state, "non-numeric source state; re-using last input");
                self.last_x
            }
        };
        self.apply(now_s, x)
    }

    /// Fallback trigger. Suppressed while a genuine event is recent enough;
    /// a no-op until the first input has ever been seen.
    pub fn handle_tick(&mut self, now_s: f64) -> Option<f64> {
        if let Some(src_s) = self.last_source_event_s
            && now_s - src_s < self.update_s
        {
            return None;
        }
        self.apply(now_s, self.last_x)
    }

    /// The single mutation point both trigger paths funnel through.
    fn apply(&mut self, now_s: f64, x: Option<f64>) -> Option<f64> {
        let x = x?;
        let dt = (now_s - self.last_update_s).max(0.0);
        self.last_update_s = now_s;
        let y = self.filter.tick(x, dt, now_s);
        self.last_x = Some(x);
        tracing::trace!(x, dt, y, "filter tick");
        Some(y)
    }

    /// Seed filter state from a persisted value, once, before any tick.
    /// For the low-pass method the restored estimate also becomes the
    /// re-feedable input, so fallback ticks hold the output steady instead
    /// of waiting for the first event.
    pub fn restore(&mut self, y: f64) {
        self.filter.restore(y);
        if self.filter.method() == Method::LowPass {
            self.last_x = Some(y);
        }
    }

    pub fn value(&self) -> f64 {
        self.filter.value()
    }

    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    pub fn update_s(&self) -> f64 {
        self.update_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Integrator, LowPass, TimeSma};
    use tickfilter_traits::SourceEvent;

    fn lowpass_sched(tau_s: f64, update_s: f64) -> UpdateScheduler {
        UpdateScheduler::new(
            Filter::LowPass(LowPass::new(tau_s)),
            UnitConverter::new(Method::LowPass, None),
            update_s,
            0.0,
        )
    }

    fn event(state: &str, unit: Option<&str>) -> SourceEvent {
        SourceEvent::new(state, unit)
    }

    #[test]
    fn fallback_before_any_event_is_noop() {
        let mut s = lowpass_sched(30.0, 30.0);
        assert_eq!(s.handle_tick(100.0), None);
        assert_eq!(s.value(), 0.0);
    }

    #[test]
    fn fallback_suppressed_within_update_period() {
        let mut s = lowpass_sched(30.0, 30.0);
        s.handle_event(0.0, &event("100", Some("W")));
        // Just before the period elapses: suppressed, nothing mutated.
        assert_eq!(s.handle_tick(29.9), None);
        // Just after: re-feeds the last observed input.
        let y = s.handle_tick(30.1).expect("fallback tick should fire");
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn parse_failure_reuses_last_input() {
        let mut s = lowpass_sched(30.0, 30.0);
        s.handle_event(0.0, &event("100", Some("W")));
        let y = s
            .handle_event(10.0, &event("unavailable", Some("W")))
            .expect("should tick with the previous input");
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn parse_failure_without_history_skips_the_tick() {
        let mut s = lowpass_sched(30.0, 30.0);
        assert_eq!(s.handle_event(0.0, &event("unknown", None)), None);
        assert_eq!(s.value(), 0.0);
        // The event still counted for suppression purposes.
        assert_eq!(s.handle_tick(10.0), None);
    }

    #[test]
    fn negative_elapsed_time_is_clamped_to_zero() {
        let mut s = lowpass_sched(30.0, 30.0);
        s.handle_event(100.0, &event("100", None));
        // Out-of-order timestamp: dt clamps to 0, alpha is 0, y holds.
        let y = s.handle_event(50.0, &event("500", None)).expect("tick");
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn event_applies_unit_scale_before_filtering() {
        let mut s = UpdateScheduler::new(
            Filter::Integrator(Integrator::new()),
            UnitConverter::new(Method::Integrator, Some("Wh".into())),
            30.0,
            0.0,
        );
        s.handle_event(0.0, &event("3600", Some("W")));
        // 3600 W scaled into Wh-rate: x = 1.0; one second adds 1 Wh.
        let y = s.handle_event(1.0, &event("3600", Some("W"))).expect("tick");
        assert!((y - 1.0).abs() < 1e-9, "got {y}");
    }

    #[test]
    fn restored_lowpass_serves_fallback_ticks_without_events() {
        let mut s = lowpass_sched(30.0, 30.0);
        s.restore(42.0);
        let y = s.handle_tick(100.0).expect("restored value is re-feedable");
        assert!((y - 42.0).abs() < 1e-9);
    }

    #[test]
    fn time_sma_single_event_projects_exactly() {
        let mut s = UpdateScheduler::new(
            Filter::TimeSma(TimeSma::new(30.0)),
            UnitConverter::new(Method::TimeSma, None),
            30.0,
            0.0,
        );
        let y = s.handle_event(5.0, &event("100", Some("W"))).expect("tick");
        assert_eq!(y, 100.0);
    }
}
