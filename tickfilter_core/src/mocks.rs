//! Test and helper doubles for tickfilter_core.

use std::collections::VecDeque;
use std::time::Duration;
use tickfilter_traits::{BoxError, Sink, Source, SourceEvent, StateUpdate};

/// A sink that records every published update.
#[derive(Debug, Default)]
pub struct VecSink {
    pub updates: Vec<StateUpdate>,
}

impl Sink for VecSink {
    fn publish(&mut self, update: &StateUpdate) -> Result<(), BoxError> {
        self.updates.push(update.clone());
        Ok(())
    }
}

/// A source that replays a fixed script of `(delay, event)` pairs, sleeping
/// out each delay in real time, then reports end-of-stream.
pub struct ScriptedSource {
    script: VecDeque<(Duration, SourceEvent)>,
}

impl ScriptedSource {
    pub fn new(script: Vec<(Duration, SourceEvent)>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Source for ScriptedSource {
    fn recv(&mut self, timeout: Duration) -> Result<Option<SourceEvent>, BoxError> {
        match self.script.pop_front() {
            Some((delay, ev)) if delay <= timeout => {
                std::thread::sleep(delay);
                Ok(Some(ev))
            }
            Some((delay, ev)) => {
                // Not due within this poll slice; wait it out and requeue.
                std::thread::sleep(timeout);
                self.script.push_front((delay - timeout, ev));
                Ok(None)
            }
            None => Err("script exhausted".into()),
        }
    }
}
