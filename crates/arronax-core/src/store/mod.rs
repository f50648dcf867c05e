// ── State store ──
//
// Single-writer application state published through a `watch` channel.
// `dispatch` runs the reducer in place and wakes every subscriber; readers
// take cheap `Arc` snapshots.

mod action;
pub mod selectors;
mod state;

use std::sync::Arc;

use tokio::sync::watch;

pub use action::{StoreAction, reduce};
pub use state::{AvailableValues, EntityData, ExplorerState, ModalState};

use crate::stream::StateStream;

pub struct StateStore {
    tx: watch::Sender<Arc<ExplorerState>>,
}

impl StateStore {
    pub fn new(initial: ExplorerState) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: StoreAction) {
        self.tx
            .send_modify(|state| reduce(Arc::make_mut(state), action));
    }

    /// Current state.
    pub fn snapshot(&self) -> Arc<ExplorerState> {
        self.tx.borrow().clone()
    }

    /// Run a selector against the current state without cloning it.
    pub fn select<T>(&self, f: impl FnOnce(&ExplorerState) -> T) -> T {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.tx.subscribe())
    }
}
