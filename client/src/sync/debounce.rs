use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Keyed, cancellable deferred notifications.
///
/// Scheduling a key that already has a pending timer aborts that timer and
/// arms a new one, so only the last write within the quiet period fires.
/// Dropping the debouncer aborts every pending timer.
///
/// Timers run on the ambient tokio runtime; [`Debouncer::schedule`] must be
/// called from within one.
pub struct Debouncer<K> {
    delay: Duration,
    next_generation: u64,
    pending: HashMap<K, Pending>,
    tx: mpsc::UnboundedSender<(K, u64)>,
    rx: mpsc::UnboundedReceiver<(K, u64)>,
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

impl<K> Debouncer<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            next_generation: 0,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    /// (Re)arms the timer for `key`.
    pub fn schedule(&mut self, key: K) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let deadline = Instant::now() + self.delay;

        let tx = self.tx.clone();
        let fired_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tx.send((fired_key, generation)).ok();
        });

        if let Some(previous) = self.pending.insert(key, Pending { generation, handle }) {
            previous.handle.abort();
        }
    }

    pub fn cancel(&mut self, key: &K) {
        if let Some(pending) = self.pending.remove(key) {
            pending.handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Aborts every pending timer and returns the keys they belonged to.
    pub fn drain_pending(&mut self) -> Vec<K> {
        self.pending
            .drain()
            .map(|(key, pending)| {
                pending.handle.abort();
                key
            })
            .collect()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Waits for the next live timer and returns its key.
    ///
    /// Notifications from aborted or superseded timers are skipped. Never
    /// completes while nothing is scheduled. Cancel safe.
    pub async fn fired(&mut self) -> K {
        loop {
            // `self` owns a sender, so the channel never closes.
            let Some((key, generation)) = self.rx.recv().await else {
                return std::future::pending().await;
            };

            match self.pending.get(&key) {
                Some(pending) if pending.generation == generation => {
                    self.pending.remove(&key);
                    return key;
                }
                _ => tracing::trace!("skipping stale debounce notification"),
            }
        }
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.handle.abort();
        }
    }
}
