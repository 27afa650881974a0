//! Serialized update loop.
//!
//! The host-facing callbacks are modeled as two channels: genuine source
//! events forwarded by a `SourceTap`, and a periodic fallback ticker at a
//! quarter of the update period. One `select!` loop merges them into a
//! single ordered stream of tick requests, so filter state is only ever
//! mutated from one thread.
//!
//! Teardown discipline: the tap owns its thread and joins it on `Drop`, and
//! dropping the tap disconnects the event channel, which ends the loop. No
//! callback can outlive the filter it feeds.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::TickFilter;
use crate::error::{FilterError, Result};
use tickfilter_traits::{Clock, Sink, Source, SourceEvent};

/// Poll slice used by the tap thread so it can notice shutdown promptly even
/// when the source is quiet.
const TAP_POLL: Duration = Duration::from_millis(50);

/// Owns a `Source` on a background thread and forwards its events into a
/// bounded channel. The thread shuts down when the tap is dropped or when
/// the source reports end-of-stream.
pub struct SourceTap {
    rx: xch::Receiver<SourceEvent>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SourceTap {
    pub fn spawn<S: Source + Send + 'static>(mut source: S) -> Self {
        let (tx, rx) = xch::bounded(16);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            'pump: loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("source tap received shutdown signal");
                    break;
                }
                match source.recv(TAP_POLL) {
                    Ok(Some(mut ev)) => {
                        // The consumer may have stopped draining. Never block
                        // in send: a blocked send would hang the join in Drop,
                        // since Drop keeps the receiver alive.
                        loop {
                            match tx.send_timeout(ev, TAP_POLL) {
                                Ok(()) => break,
                                Err(xch::SendTimeoutError::Timeout(returned)) => {
                                    if shutdown_clone.load(Ordering::Relaxed) {
                                        tracing::debug!(
                                            "source tap received shutdown signal with a full channel"
                                        );
                                        break 'pump;
                                    }
                                    ev = returned;
                                }
                                Err(xch::SendTimeoutError::Disconnected(_)) => {
                                    tracing::debug!(
                                        "source tap consumer disconnected, exiting thread"
                                    );
                                    break 'pump;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        // Quiet poll slice; loop and re-check shutdown.
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "source stream ended");
                        break;
                    }
                }
            }
            tracing::trace!("source tap thread exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Receiver side of the event channel, for `run`.
    pub fn events(&self) -> &xch::Receiver<SourceEvent> {
        &self.rx
    }
}

impl Drop for SourceTap {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("source tap thread joined successfully"),
                Err(e) => tracing::warn!(?e, "source tap thread panicked during shutdown"),
            }
        }
    }
}

/// Drive one filter until its event channel closes or `shutdown` is set,
/// publishing every produced update through the sink.
pub fn run<K, C>(
    filter: &mut TickFilter,
    events: &xch::Receiver<SourceEvent>,
    sink: &mut K,
    clock: &C,
    shutdown: &AtomicBool,
) -> Result<()>
where
    K: Sink,
    C: Clock,
{
    let epoch = clock.now();
    let ticker = xch::tick(crate::util::fallback_period(filter.update_s()));
    tracing::info!(
        name = filter.name(),
        update_s = filter.update_s(),
        "filter loop start"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(name = filter.name(), "shutdown requested; stopping");
            break;
        }
        xch::select! {
            recv(events) -> msg => match msg {
                Ok(ev) => {
                    let now_s = clock.secs_since(epoch);
                    if let Some(update) = filter.handle_event(now_s, &ev) {
                        sink.publish(&update)
                            .map_err(|e| eyre::Report::new(FilterError::Publish(e.to_string())))?;
                    }
                }
                Err(_) => {
                    tracing::info!(name = filter.name(), "source channel closed; stopping");
                    break;
                }
            },
            recv(ticker) -> msg => {
                if msg.is_err() {
                    return Err(eyre::Report::new(FilterError::State(
                        "fallback ticker disconnected".into(),
                    )));
                }
                let now_s = clock.secs_since(epoch);
                if let Some(update) = filter.handle_tick(now_s) {
                    sink.publish(&update)
                        .map_err(|e| eyre::Report::new(FilterError::Publish(e.to_string())))?;
                }
            }
        }
    }

    tracing::info!(
        name = filter.name(),
        final_value = filter.value(),
        "filter loop stop"
    );
    Ok(())
}
