//! Outbound event delivery to the transport collaborator.
//!
//! The orchestrator never talks to a transport directly; it hands events to
//! a [`BufferedSink`], which forwards while the transport is ready and
//! otherwise queues up to a bound, dropping the oldest beyond it. An
//! unavailable transport is backpressure, not an error.

use crate::log_debug;
use crate::protocol::OutboundEvent;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Where outbound events land. Implementations must be cheap and
/// non-blocking; slow transports should report `ready() == false` instead
/// of stalling delivery.
pub trait EventSink: Send + Sync {
    fn ready(&self) -> bool {
        true
    }

    fn deliver(&self, event: &OutboundEvent);
}

/// Decorator that queues events while the transport is unavailable and
/// flushes them in order once it comes back, dropping the oldest past the
/// configured bound.
pub struct BufferedSink {
    inner: Box<dyn EventSink>,
    queue: Mutex<VecDeque<OutboundEvent>>,
    bound: usize,
    dropped: AtomicU64,
}

impl BufferedSink {
    pub fn new(inner: Box<dyn EventSink>, bound: usize) -> Self {
        Self {
            inner,
            queue: Mutex::new(VecDeque::new()),
            bound: bound.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn deliver(&self, event: OutboundEvent) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if self.inner.ready() {
            for queued in queue.drain(..) {
                self.inner.deliver(&queued);
            }
            self.inner.deliver(&event);
            return;
        }

        queue.push_back(event);
        while queue.len() > self.bound {
            queue.pop_front();
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            log_debug(&format!("transport unavailable, dropped event ({total} total)"));
        }
    }

    /// Events discarded because the transport stayed unavailable.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Newline-delimited JSON on stdout, for the CLI and for piping into other
/// processes.
pub struct NdjsonSink {
    out: Mutex<std::io::Stdout>,
}

impl NdjsonSink {
    pub fn stdout() -> Self {
        Self {
            out: Mutex::new(std::io::stdout()),
        }
    }
}

impl EventSink for NdjsonSink {
    fn deliver(&self, event: &OutboundEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Adapter for closure-based consumers.
pub struct FnSink<F>(pub F)
where
    F: Fn(&OutboundEvent) + Send + Sync;

impl<F> EventSink for FnSink<F>
where
    F: Fn(&OutboundEvent) + Send + Sync,
{
    fn deliver(&self, event: &OutboundEvent) {
        (self.0)(event);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// Sink that records everything it receives, with a switchable ready
    /// flag to simulate transport outages.
    #[derive(Clone, Default)]
    pub(crate) struct CollectingSink {
        pub(crate) events: Arc<Mutex<Vec<OutboundEvent>>>,
        pub(crate) available: Arc<AtomicBool>,
    }

    impl CollectingSink {
        pub(crate) fn new() -> Self {
            let sink = Self::default();
            sink.available.store(true, Ordering::SeqCst);
            sink
        }

        pub(crate) fn events(&self) -> Vec<OutboundEvent> {
            self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    impl EventSink for CollectingSink {
        fn ready(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        fn deliver(&self, event: &OutboundEvent) {
            self.events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.clone());
        }
    }
}
