//! The three time-domain filter algorithms.
//!
//! Each variant consumes `(x, dt, now_s)` and produces an updated estimate.
//! `dt` is elapsed seconds since the previous tick (callers clamp it to be
//! non-negative); `now_s` is absolute wall-clock seconds and only the
//! time-weighted average uses it, to age its retained window.

use std::collections::VecDeque;

/// Selected filtering method. A closed set; construction maps the validated
/// config enum to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    TimeSma,
    LowPass,
    Integrator,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimeSma => "time_sma",
            Self::LowPass => "lowpass",
            Self::Integrator => "integrator",
        }
    }
}

impl From<tickfilter_config::Method> for Method {
    fn from(m: tickfilter_config::Method) -> Self {
        match m {
            tickfilter_config::Method::TimeSma => Self::TimeSma,
            tickfilter_config::Method::Lowpass => Self::LowPass,
            tickfilter_config::Method::Integrator => Self::Integrator,
        }
    }
}

/// One retained `(timestamp, value)` pair in the time-weighted window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_s: f64,
    pub value: f64,
}

/// Polymorphic filter state; mutated by `tick`, never replaced.
#[derive(Debug)]
pub enum Filter {
    TimeSma(TimeSma),
    LowPass(LowPass),
    Integrator(Integrator),
}

impl Filter {
    /// Feed one input and return the updated estimate.
    pub fn tick(&mut self, x: f64, dt: f64, now_s: f64) -> f64 {
        match self {
            Self::TimeSma(f) => f.tick(x, now_s),
            Self::LowPass(f) => f.tick(x, dt),
            Self::Integrator(f) => f.tick(x, dt),
        }
    }

    /// Current estimate; 0.0 (or the restored value) before the first tick.
    pub fn value(&self) -> f64 {
        match self {
            Self::TimeSma(f) => f.y,
            Self::LowPass(f) => f.y,
            Self::Integrator(f) => f.y,
        }
    }

    /// Seed the estimate from a persisted value. Called at most once, before
    /// any tick. The low-pass filter keeps the seed as its initialized state
    /// so the next tick blends instead of resetting.
    pub fn restore(&mut self, y: f64) {
        match self {
            Self::TimeSma(f) => f.y = y,
            Self::LowPass(f) => {
                f.y = y;
                f.initialized = true;
            }
            Self::Integrator(f) => f.y = y,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::TimeSma(_) => Method::TimeSma,
            Self::LowPass(_) => Method::LowPass,
            Self::Integrator(_) => Method::Integrator,
        }
    }
}

/// Time-weighted moving average over a trailing wall-clock window.
///
/// Retention is driven by elapsed time, not sample count: every tick evicts
/// samples older than `now - window_s`, then averages the remainder by
/// trapezoidal segments.
#[derive(Debug)]
pub struct TimeSma {
    window_s: f64,
    /// Retained samples, oldest first, timestamps non-decreasing.
    samples: VecDeque<Sample>,
    y: f64,
}

impl TimeSma {
    pub fn new(window_s: f64) -> Self {
        Self {
            window_s,
            samples: VecDeque::new(),
            y: 0.0,
        }
    }

    fn tick(&mut self, x: f64, now_s: f64) -> f64 {
        let cutoff = now_s - self.window_s;
        while self.samples.front().is_some_and(|s| s.timestamp_s < cutoff) {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            timestamp_s: now_s,
            value: x,
        });

        if self.samples.len() < 2 {
            // Cannot time-weight a single point.
            self.y = x;
            return self.y;
        }

        let mut total_area = 0.0;
        let mut total_time = 0.0;
        let mut prev = self.samples[0];
        for s in self.samples.iter().skip(1) {
            let span = s.timestamp_s - prev.timestamp_s;
            total_area += 0.5 * (prev.value + s.value) * span;
            total_time += span;
            prev = *s;
        }
        // Degenerate window (duplicate timestamps): keep the previous estimate.
        if total_time > 0.0 {
            self.y = total_area / total_time;
        }
        self.y
    }
}

/// First-order low-pass with a dt-adaptive coefficient.
///
/// `alpha = 1 - exp(-dt/tau)` makes the smoothing time constant invariant to
/// the actual sampling interval: a long gap pulls the estimate almost fully
/// to the new input, rapid updates blend gently.
#[derive(Debug)]
pub struct LowPass {
    tau_s: f64,
    initialized: bool,
    y: f64,
}

impl LowPass {
    /// `tau_s` must be strictly positive; the builder rejects anything else.
    pub fn new(tau_s: f64) -> Self {
        Self {
            tau_s,
            initialized: false,
            y: 0.0,
        }
    }

    fn tick(&mut self, x: f64, dt: f64) -> f64 {
        if !self.initialized {
            self.y = x;
            self.initialized = true;
            return self.y;
        }
        let alpha = 1.0 - (-dt / self.tau_s).exp();
        self.y = (1.0 - alpha) * self.y + alpha * x;
        self.y
    }
}

/// Running time integral of the input (e.g. power into energy).
///
/// Monotonically non-decreasing only for non-negative inputs; signed inputs
/// integrate to a signed accumulated quantity, which is accepted behavior.
#[derive(Debug, Default)]
pub struct Integrator {
    y: f64,
    prev_x: Option<f64>,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self, x: f64, dt: f64) -> f64 {
        // Trapezoidal rule once a previous input exists; rectangle otherwise.
        match self.prev_x {
            Some(px) => self.y += 0.5 * (px + x) * dt,
            None => self.y += x * dt,
        }
        self.prev_x = Some(x);
        self.y
    }
}
