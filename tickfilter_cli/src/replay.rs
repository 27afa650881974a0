//! Replay a recorded event file through one configured filter.
//!
//! The event file is JSON lines, one source state change per line:
//!
//! ```text
//! {"t": 0.0,  "state": 120.5, "unit": "W"}
//! {"t": 12.3, "state": "unavailable"}
//! ```
//!
//! `t` is seconds from the start of the recording. Playback paces events by
//! their inter-arrival gaps divided by `--speed`; the filter itself measures
//! elapsed time from a monotonic clock, so sped-up replays compress the
//! filter's timeline accordingly.

use eyre::WrapErr;
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tickfilter_core::TickFilter;
use tickfilter_core::mocks::ScriptedSource;
use tickfilter_core::runner::{self, SourceTap};
use tickfilter_traits::{BoxError, MonotonicClock, Sink, SourceEvent, StateUpdate};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateField {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ReplayLine {
    t: f64,
    state: StateField,
    unit: Option<String>,
    device_class: Option<String>,
    state_class: Option<String>,
}

impl ReplayLine {
    fn into_event(self) -> SourceEvent {
        let state = match self.state {
            StateField::Number(v) => format!("{v}"),
            StateField::Text(s) => s,
        };
        SourceEvent {
            state,
            unit: self.unit,
            device_class: self.device_class,
            state_class: self.state_class,
        }
    }
}

/// Parse the event file into a delay-paced script. Delays are the
/// inter-arrival gaps scaled by `speed`; the first event fires immediately.
fn load_script(path: &Path, speed: f64) -> eyre::Result<Vec<(Duration, SourceEvent)>> {
    if !(speed.is_finite() && speed > 0.0) {
        eyre::bail!("--speed must be a positive number, got {speed}");
    }
    let file = std::fs::File::open(path)
        .wrap_err_with(|| format!("failed to open event file {}", path.display()))?;
    let mut script = Vec::new();
    let mut prev_t: Option<f64> = None;
    for (idx, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.wrap_err_with(|| format!("read error at line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ReplayLine = serde_json::from_str(&line)
            .wrap_err_with(|| format!("bad event at line {}", idx + 1))?;
        if !parsed.t.is_finite() {
            eyre::bail!("bad event at line {}: t must be finite", idx + 1);
        }
        if let Some(prev) = prev_t
            && parsed.t < prev
        {
            eyre::bail!("bad event at line {}: t went backwards", idx + 1);
        }
        let gap = prev_t.map_or(0.0, |prev| (parsed.t - prev) / speed);
        prev_t = Some(parsed.t);
        script.push((Duration::from_secs_f64(gap), parsed.into_event()));
    }
    if script.is_empty() {
        eyre::bail!("event file {} contains no events", path.display());
    }
    Ok(script)
}

/// Writes each published update to stdout, one line per update.
struct StdoutSink {
    json: bool,
    published: u64,
}

impl Sink for StdoutSink {
    fn publish(&mut self, update: &StateUpdate) -> Result<(), BoxError> {
        self.published += 1;
        if self.json {
            let line = serde_json::json!({
                "value": update.value,
                "unit": update.unit,
                "device_class": update.device_class,
                "state_class": update.state_class,
                "force_update": update.force_update,
                "attributes": {
                    "source": update.attributes.source,
                    "method": update.attributes.method,
                    "update_s": update.attributes.update_s,
                    "window_s": update.attributes.window_s,
                    "tau_s": update.attributes.tau_s,
                },
            });
            println!("{line}");
        } else {
            let unit = update.unit.as_deref().unwrap_or("");
            println!("{} {}", update.value, unit);
        }
        Ok(())
    }
}

fn select_sensor<'a>(
    config: &'a tickfilter_config::Config,
    selector: Option<&str>,
) -> eyre::Result<&'a tickfilter_config::SensorCfg> {
    let Some(wanted) = selector else {
        // Config validation guarantees at least one sensor table.
        return config
            .sensor
            .first()
            .ok_or_else(|| eyre::eyre!("config has no sensors"));
    };
    config
        .sensor
        .iter()
        .find(|s| s.unique_id.as_deref() == Some(wanted) || s.source == wanted)
        .ok_or_else(|| eyre::eyre!("no sensor with unique_id or source {wanted:?}"))
}

pub fn run_replay(
    config: &tickfilter_config::Config,
    events: &Path,
    selector: Option<&str>,
    speed: f64,
    restore: Option<f64>,
) -> eyre::Result<()> {
    let sensor = select_sensor(config, selector)?;
    let script = load_script(events, speed)?;
    tracing::info!(
        source = %sensor.source,
        method = sensor.method.as_str(),
        events = script.len(),
        speed,
        "replay start"
    );

    let mut filter = TickFilter::from_config(sensor, 0.0)?;
    if let Some(y) = restore {
        filter.restore_value(y);
        tracing::info!(restored = y, "seeded estimate from persisted value");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("failed to install Ctrl-C handler")?;
    }

    let json = crate::cli::JSON_MODE.get().copied().unwrap_or(false);
    let mut sink = StdoutSink { json, published: 0 };
    let tap = SourceTap::spawn(ScriptedSource::new(script));
    runner::run(&mut filter, tap.events(), &mut sink, &MonotonicClock, &shutdown)?;
    drop(tap);

    tracing::info!(
        published = sink.published,
        final_value = filter.value(),
        "replay done"
    );
    Ok(())
}
