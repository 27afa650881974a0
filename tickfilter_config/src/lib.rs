#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for tick filter sensors.
//!
//! A config file declares one `[[sensor]]` table per filter instance.
//! Structs are deserialized from TOML and then checked with `validate()`;
//! parse errors and range violations are both construction-time failures.

use serde::Deserialize;

/// Filtering method. A closed set: anything else fails at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    TimeSma,
    Lowpass,
    Integrator,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimeSma => "time_sma",
            Self::Lowpass => "lowpass",
            Self::Integrator => "integrator",
        }
    }
}

/// One filter sensor declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorCfg {
    /// Identifier of the numeric source stream to observe.
    pub source: String,
    pub method: Method,
    /// Display name; defaults to "{method} of {source}".
    #[serde(default)]
    pub name: Option<String>,
    /// Stable id the host uses for idempotent registration.
    #[serde(default)]
    pub unique_id: Option<String>,
    /// Nominal update period in seconds. Fallback ticks fire at a quarter of this.
    #[serde(default = "default_update_s")]
    pub update_s: f64,
    /// Trailing window span in seconds (time_sma only).
    #[serde(default = "default_window_s")]
    pub window_s: f64,
    /// Smoothing time constant in seconds (lowpass only).
    #[serde(default = "default_tau_s")]
    pub tau_s: f64,
    /// Publication hint forwarded to the host; not used by the core logic.
    #[serde(default = "default_force_update")]
    pub force_update: bool,
    /// Decimal places for the published value; negative rounds to tens,
    /// hundreds and so on. Unset publishes the raw float.
    #[serde(default)]
    pub round: Option<i32>,
    /// Explicit output unit; overrides auto-adoption from the source.
    #[serde(default)]
    pub unit_of_measurement: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sensor: Vec<SensorCfg>,
}

fn default_update_s() -> f64 {
    30.0
}
fn default_window_s() -> f64 {
    60.0
}
fn default_tau_s() -> f64 {
    30.0
}
fn default_force_update() -> bool {
    true
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.sensor.is_empty() {
            eyre::bail!("config declares no [[sensor]] tables");
        }
        let mut seen_ids: Vec<&str> = Vec::new();
        for (i, s) in self.sensor.iter().enumerate() {
            s.validate()
                .map_err(|e| eyre::eyre!("sensor[{i}] ({}): {e}", s.source))?;
            if let Some(id) = s.unique_id.as_deref() {
                if seen_ids.contains(&id) {
                    eyre::bail!("sensor[{i}]: duplicate unique_id {id:?}");
                }
                seen_ids.push(id);
            }
        }
        Ok(())
    }
}

impl SensorCfg {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.source.trim().is_empty() {
            eyre::bail!("source must not be empty");
        }
        if !self.update_s.is_finite() || self.update_s < 1.0 {
            eyre::bail!("update_s must be >= 1");
        }
        if !self.window_s.is_finite() || self.window_s < 1.0 {
            eyre::bail!("window_s must be >= 1");
        }
        if !self.tau_s.is_finite() || self.tau_s < 0.001 {
            eyre::bail!("tau_s must be >= 0.001");
        }
        if let Some(places) = self.round
            && !(-12..=12).contains(&places)
        {
            eyre::bail!("round must be in [-12, 12]");
        }
        Ok(())
    }
}
