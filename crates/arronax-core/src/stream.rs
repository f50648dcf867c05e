// ── Reactive state stream ──
//
// Subscription handle for consumers that redraw on state changes.

use std::sync::Arc;

use tokio::sync::watch;

use crate::store::ExplorerState;

/// A subscription to the explorer state.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed).
pub struct StateStream {
    current: Arc<ExplorerState>,
    receiver: watch::Receiver<Arc<ExplorerState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ExplorerState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &Arc<ExplorerState> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<ExplorerState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<ExplorerState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
