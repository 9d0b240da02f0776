//! Single-writer attention state store.
//!
//! Backed by a `tokio::sync::watch` channel: the capture manager and the
//! detection loop publish whole transitions through `update`, and any number
//! of observers read snapshots or wait for the next change. Observers never
//! see a half-applied transition.

use std::sync::Arc;
use tokio::sync::watch;
use watchful_models::AttentionState;

/// Shared handle to the attention state.
///
/// Cloning is cheap; all clones publish to the same record.
#[derive(Clone)]
pub struct AttentionStore {
    tx: Arc<watch::Sender<AttentionState>>,
}

impl AttentionStore {
    /// Create a store holding the initial state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AttentionState::new());
        Self { tx: Arc::new(tx) }
    }

    /// Latest published state.
    pub fn snapshot(&self) -> AttentionState {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every published transition.
    pub fn subscribe(&self) -> watch::Receiver<AttentionState> {
        self.tx.subscribe()
    }

    /// Apply one transition and notify observers.
    pub(crate) fn update<F>(&self, transition: F)
    where
        F: FnOnce(&mut AttentionState),
    {
        self.tx.send_modify(transition);
    }
}

impl Default for AttentionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AttentionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttentionStore")
            .field("state", &*self.tx.borrow())
            .field("observers", &self.tx.receiver_count())
            .finish()
    }
}
