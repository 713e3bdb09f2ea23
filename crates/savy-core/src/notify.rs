//! Fan-out of "snapshot changed" signals to every open view.
//!
//! Views sharing a [`ChangeNotifier`] hear each save directly. Views that only
//! share the underlying storage (another engine, another process) notice the
//! stored revision moving the next time they poll.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::storage::{Revision, SnapshotStore};

/// Event name announced after every successful save.
pub const SAVY_STATE_EVENT: &str = "savy-state-change";

const DEFAULT_CAPACITY: usize = 16;

/// Payload-free notification; receivers re-load to observe the new snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged;

impl StateChanged {
    pub const NAME: &'static str = SAVY_STATE_EVENT;
}

/// Lightweight broadcast bus shared by every view of one snapshot store.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<StateChanged>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            watch: None,
        }
    }

    /// Publishes one notification and returns how many subscribers received it.
    pub fn publish(&self) -> usize {
        // Having no listeners is not a failure.
        self.sender.send(StateChanged).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A view's handle on the notification stream.
pub struct Subscription {
    receiver: broadcast::Receiver<StateChanged>,
    watch: Option<StoreWatch>,
}

struct StoreWatch {
    store: Arc<dyn SnapshotStore>,
    seen: Option<Revision>,
}

impl Subscription {
    /// Also reports writes to `store` made by handles outside this notifier.
    pub fn watching(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        let seen = store.revision().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read the stored revision");
            None
        });
        self.watch = Some(StoreWatch { store, seen });
        self
    }

    /// Drains pending notifications and reports whether the snapshot changed
    /// since the last poll.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(StateChanged) => changed = true,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscription lagged behind notifications");
                    changed = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if let Some(watch) = &mut self.watch {
            match watch.store.revision() {
                Ok(current) if current != watch.seen => {
                    watch.seen = current;
                    changed = true;
                }
                Ok(_) => {}
                Err(err) => {
                    // Unknown state; let the view re-load and surface the error.
                    tracing::warn!(error = %err, "could not read the stored revision");
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber_once() {
        let notifier = ChangeNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        assert_eq!(notifier.publish(), 2);
        assert!(first.poll());
        assert!(second.poll());
        assert!(!first.poll(), "poll drains pending notifications");
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let notifier = ChangeNotifier::default();
        assert_eq!(notifier.publish(), 0);
        let mut late = notifier.subscribe();
        assert!(!late.poll(), "late subscribers miss earlier notifications");
    }

    #[test]
    fn watched_store_reports_foreign_writes() {
        let store = Arc::new(crate::storage::MemoryStore::with_document("{}"));
        let notifier = ChangeNotifier::default();
        let mut view = notifier.subscribe().watching(store.clone());
        assert!(!view.poll());

        // Written through a handle that never publishes on this notifier.
        store.write(r#"{"availableCash": 5}"#).expect("write");
        assert!(view.poll());
        assert!(!view.poll(), "the new revision is remembered");
    }

    #[test]
    fn lagging_subscriber_still_reports_change() {
        let notifier = ChangeNotifier::new(1);
        let mut view = notifier.subscribe();
        for _ in 0..5 {
            notifier.publish();
        }
        assert!(view.poll());
        assert!(!view.poll());
    }
}
