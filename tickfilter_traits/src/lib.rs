pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error type used across the host-facing traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One raw state change observed on the source stream.
///
/// The state payload is carried as text; whether it parses as a number is the
/// consumer's concern, not the stream's.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceEvent {
    /// Raw state payload as reported by the source.
    pub state: String,
    /// Unit of measurement reported alongside the state, if any.
    pub unit: Option<String>,
    /// Source's semantic class (e.g. "power"), if reported.
    pub device_class: Option<String>,
    /// Source's state class (e.g. "measurement"), if reported.
    pub state_class: Option<String>,
}

impl SourceEvent {
    pub fn new(state: impl Into<String>, unit: Option<&str>) -> Self {
        Self {
            state: state.into(),
            unit: unit.map(str::to_owned),
            device_class: None,
            state_class: None,
        }
    }
}

/// Descriptive attribute set carried with every published update.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    /// Identifier of the observed source stream.
    pub source: String,
    /// Filter method name ("time_sma", "lowpass" or "integrator").
    pub method: &'static str,
    /// Nominal update period in seconds.
    pub update_s: f64,
    /// Window span in seconds; set for the time-weighted average method only.
    pub window_s: Option<f64>,
    /// Time constant in seconds; set for the low-pass method only.
    pub tau_s: Option<f64>,
}

/// One projected output published to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    /// Filter estimate, rounded if rounding is configured.
    pub value: f64,
    /// Output unit of measurement, once known.
    pub unit: Option<String>,
    pub device_class: Option<String>,
    pub state_class: Option<String>,
    /// Hint for the host to publish even when the value did not change.
    pub force_update: bool,
    pub attributes: Attributes,
}

/// A stream of raw state changes from one observed source.
pub trait Source {
    /// Block up to `timeout` for the next state change.
    ///
    /// `Ok(None)` means nothing arrived within the timeout; `Err` means the
    /// stream has ended for good and no further events will be produced.
    fn recv(&mut self, timeout: std::time::Duration) -> Result<Option<SourceEvent>, BoxError>;
}

/// Consumer for projected state updates.
pub trait Sink {
    fn publish(&mut self, update: &StateUpdate) -> Result<(), BoxError>;
}
