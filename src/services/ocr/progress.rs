use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::engine::EngineEvent;

/// Status of the phase whose progress is surfaced
pub const RECOGNIZING_TEXT: &str = "recognizing text";

type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Identifies one `on_progress` registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct ObserverInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, ProgressCallback)>,
    latest: Option<f64>,
}

/// Shared progress subscription point for one engine handle
///
/// Engines emit free-form status events. Only the text recognition phase
/// carries meaningful completion; everything else is logged and dropped.
/// Clones observe the same subscribers and latest value.
#[derive(Clone, Default)]
pub struct ProgressObserver {
    inner: Arc<Mutex<ObserverInner>>,
}

/// Map an engine fraction to a whole percentage
pub fn to_percent(fraction: f64) -> f64 {
    (fraction * 100.0).round()
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback receiving percentages in emission order
    pub fn on_progress<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        inner.subscribers.len() != before
    }

    /// Percentages as a channel; the subscription ends when the receiver is dropped
    pub fn stream(&self) -> mpsc::UnboundedReceiver<f64> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Weak, or the sender would keep the observer alive forever
        let observer = Arc::downgrade(&self.inner);
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let own_id = Arc::clone(&slot);

        let id = self.on_progress(move |percent| {
            if tx.send(percent).is_err() {
                if let (Some(id), Some(inner)) = (own_id.lock().take(), observer.upgrade()) {
                    inner.lock().subscribers.retain(|(sub, _)| *sub != id);
                }
            }
        });
        *slot.lock() = Some(id);
        rx
    }

    /// Forget the previous run's value
    pub fn begin_run(&self) {
        self.inner.lock().latest = None;
    }

    /// Feed one engine event. Returns the percentage if it was a progress event.
    pub fn observe(&self, event: &EngineEvent) -> Option<f64> {
        if event.status != RECOGNIZING_TEXT {
            tracing::debug!(status = %event.status, "engine status");
            return None;
        }
        let percent = to_percent(event.progress?);

        // Callbacks may re-enter the observer, so call them unlocked
        let subscribers: Vec<ProgressCallback> = {
            let mut inner = self.inner.lock();
            inner.latest = Some(percent);
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        for callback in subscribers {
            callback(percent);
        }
        Some(percent)
    }

    /// Last percentage of the current run
    pub fn latest_percent(&self) -> Option<f64> {
        self.inner.lock().latest
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}
