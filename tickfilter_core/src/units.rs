//! Unit adoption and scale resolution between source and output units.
//!
//! The output unit is authoritative when configured; otherwise it is adopted
//! from the first observed source unit (never for the integrator, whose
//! output unit is a different quantity than its input). The scale factor is
//! re-derived on every event against that fixed output unit.

use crate::filter::Method;
use tickfilter_traits::SourceEvent;

/// Seconds-to-hours factor for `W` -> `Wh` style rate integration.
pub const HOUR_SCALE: f64 = 3600.0;
/// As above with a kilo prefix on the output, e.g. `W` -> `kWh`.
pub const KILO_HOUR_SCALE: f64 = 3_600_000.0;

#[derive(Debug)]
pub struct UnitConverter {
    method: Method,
    output_unit: Option<String>,
    device_class: Option<String>,
    state_class: Option<String>,
}

impl UnitConverter {
    pub fn new(method: Method, configured_unit: Option<String>) -> Self {
        // The integrator accumulates a total; advertise it as such from the start.
        let state_class = (method == Method::Integrator).then(|| "total_increasing".to_owned());
        Self {
            method,
            output_unit: configured_unit,
            device_class: None,
            state_class,
        }
    }

    /// Resolve the scale factor for one event, adopting the output unit and
    /// propagating source metadata where the rules call for it.
    ///
    /// An unknown unit pair is a degraded but non-fatal mode: scale 1, values
    /// pass through unconverted.
    pub fn resolve(&mut self, event: &SourceEvent) -> f64 {
        if self.output_unit.is_none() && self.method != Method::Integrator {
            self.output_unit = event.unit.clone();
        }
        let (Some(src), Some(dst)) = (event.unit.as_deref(), self.output_unit.as_deref()) else {
            return 1.0;
        };
        if src == dst {
            self.device_class = event.device_class.clone();
            self.state_class = event.state_class.clone();
            return 1.0;
        }
        if self.method == Method::Integrator && matches!(src, "W" | "kW") {
            self.device_class = Some("energy".to_owned());
        }
        if dst == format!("{src}h") {
            HOUR_SCALE
        } else if dst == format!("k{src}h") {
            KILO_HOUR_SCALE
        } else {
            tracing::trace!(src, dst, "no conversion rule; passing values through");
            1.0
        }
    }

    pub fn output_unit(&self) -> Option<&str> {
        self.output_unit.as_deref()
    }

    pub fn device_class(&self) -> Option<&str> {
        self.device_class.as_deref()
    }

    pub fn state_class(&self) -> Option<&str> {
        self.state_class.as_deref()
    }
}
