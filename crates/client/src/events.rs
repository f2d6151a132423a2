//! Session change notifications.
//!
//! A `watch` channel carrying the latest `SessionState`, the process-local
//! analog of the storage event other browser tabs receive. Receivers
//! re-derive display state from the new value; they must not answer it with
//! a network validation of their own (one context's check is enough).

use tokio::sync::watch;

use crate::types::UserRecord;

/// Latest observable session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// An authenticated session for this user is active.
    SignedIn(UserRecord),
    /// No session; consumers return to the unauthenticated entry point.
    SignedOut,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }
}

/// Publisher side of the session change channel.
#[derive(Debug)]
pub(crate) struct SessionNotifier {
    tx: watch::Sender<SessionState>,
}

impl SessionNotifier {
    pub(crate) fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a new state. The value is kept even with no receivers around,
    /// so late subscribers still start from the latest state.
    pub(crate) fn publish(&self, state: SessionState) {
        self.tx.send_replace(state);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
