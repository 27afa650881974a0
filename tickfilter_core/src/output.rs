//! Projection of the filter estimate into a host-facing state update.

use crate::units::UnitConverter;
use tickfilter_traits::{Attributes, StateUpdate};

/// Applies optional fixed-decimal rounding and attaches the descriptive
/// metadata the host expects. Stateless beyond its configuration.
#[derive(Debug, Clone)]
pub struct OutputProjector {
    round: Option<i32>,
    force_update: bool,
    attributes: Attributes,
}

impl OutputProjector {
    pub fn new(round: Option<i32>, force_update: bool, attributes: Attributes) -> Self {
        Self {
            round,
            force_update,
            attributes,
        }
    }

    pub fn project(&self, y: f64, units: &UnitConverter) -> StateUpdate {
        let value = match self.round {
            Some(places) => {
                let p = 10f64.powi(places);
                (y * p).round() / p
            }
            None => y,
        };
        StateUpdate {
            value,
            unit: units.output_unit().map(str::to_owned),
            device_class: units.device_class().map(str::to_owned),
            state_class: units.state_class().map(str::to_owned),
            force_update: self.force_update,
            attributes: self.attributes.clone(),
        }
    }
}
