//! Session registry: admission control and liveness tracking for accepted
//! connections.
//!
//! Unlike the teacher's `ConnectionRegistry`, there is no room-subscription
//! bookkeeping here — every session is independent once admitted, so this
//! registry is a single map guarded by a mutex plus a per-session
//! cancellation token for graceful shutdown and timeout sweeps.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

use cargohold_core::Session;
use tokio_util::sync::CancellationToken;

struct SessionEntry<I> {
    session: Session<I>,
    cancellation: CancellationToken,
}

/// Tracks every currently-admitted session and enforces `MaxConcurrentClients`.
pub struct SessionRegistry<I> {
    sessions: Mutex<HashMap<u64, SessionEntry<I>>>,
    max_clients: usize,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> SessionRegistry<I> {
    /// Creates an empty registry admitting at most `max_clients` concurrent
    /// sessions.
    #[must_use]
    pub fn new(max_clients: usize) -> Self {
        Self { sessions: Mutex::new(HashMap::new()), max_clients }
    }

    /// Attempts to admit a new session. Returns the session's cancellation
    /// token on success, or `None` if the registry is at capacity.
    #[allow(clippy::expect_used)]
    pub fn try_register(&self, session: Session<I>) -> Option<CancellationToken> {
        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        if sessions.len() >= self.max_clients {
            return None;
        }
        let cancellation = CancellationToken::new();
        sessions.insert(session.session_id(), SessionEntry { session, cancellation: cancellation.clone() });
        Some(cancellation)
    }

    /// Removes a session, returning its final state if it was registered.
    #[allow(clippy::expect_used)]
    pub fn unregister(&self, session_id: u64) -> Option<Session<I>> {
        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        sessions.remove(&session_id).map(|entry| entry.session)
    }

    /// Returns a snapshot of the session's current state, if registered.
    #[allow(clippy::expect_used)]
    pub fn get(&self, session_id: u64) -> Option<Session<I>> {
        let sessions = self.sessions.lock().expect("session registry mutex poisoned");
        sessions.get(&session_id).map(|entry| entry.session.clone())
    }

    /// Returns the session's cancellation token, if registered. The
    /// connection task watches this to wake a blocked read when the session
    /// is closed from outside (a timeout sweep, or shutdown).
    #[allow(clippy::expect_used)]
    pub fn cancellation_token(&self, session_id: u64) -> Option<CancellationToken> {
        let sessions = self.sessions.lock().expect("session registry mutex poisoned");
        sessions.get(&session_id).map(|entry| entry.cancellation.clone())
    }

    /// Applies `f` to the session's stored state in place, if registered.
    #[allow(clippy::expect_used)]
    pub fn update(&self, session_id: u64, f: impl FnOnce(&mut Session<I>)) -> bool {
        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        match sessions.get_mut(&session_id) {
            Some(entry) => {
                f(&mut entry.session);
                true
            },
            None => false,
        }
    }

    /// Number of currently-admitted sessions.
    #[allow(clippy::expect_used)]
    pub fn active_count(&self) -> usize {
        self.sessions.lock().expect("session registry mutex poisoned").len()
    }

    /// Cancels and returns the ids of every session idle longer than its
    /// configured timeout as of `now`. Cancelling the token is what wakes
    /// the owning connection task to close the socket; this call does not
    /// remove the session from the registry — the connection task does that
    /// itself when it observes the cancellation and exits.
    #[allow(clippy::expect_used)]
    pub fn sweep_timeouts(&self, now: I) -> Vec<u64> {
        let sessions = self.sessions.lock().expect("session registry mutex poisoned");
        let mut timed_out = Vec::new();
        for entry in sessions.values() {
            if entry.session.has_timed_out(now) {
                entry.cancellation.cancel();
                timed_out.push(entry.session.session_id());
            }
        }
        timed_out
    }

    /// Cancels every session's token, for graceful shutdown. Does not wait
    /// for the connection tasks to observe cancellation; callers await each
    /// task's join handle separately.
    #[allow(clippy::expect_used)]
    pub fn cancel_all(&self) {
        let sessions = self.sessions.lock().expect("session registry mutex poisoned");
        for entry in sessions.values() {
            entry.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use cargohold_core::SessionConfig;

    use super::*;

    type TestInstant = Duration;

    fn session(id: u64, now: TestInstant) -> Session<TestInstant> {
        Session::new(id, now, SessionConfig { session_timeout: Duration::from_secs(60) })
    }

    #[test]
    fn admission_respects_max_clients() {
        let registry: SessionRegistry<TestInstant> = SessionRegistry::new(1);
        assert!(registry.try_register(session(1, Duration::ZERO)).is_some());
        assert!(registry.try_register(session(2, Duration::ZERO)).is_none());
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn unregister_frees_capacity() {
        let registry: SessionRegistry<TestInstant> = SessionRegistry::new(1);
        registry.try_register(session(1, Duration::ZERO));
        registry.unregister(1);
        assert!(registry.try_register(session(2, Duration::ZERO)).is_some());
    }

    #[test]
    fn sweep_cancels_timed_out_sessions() {
        let registry: SessionRegistry<TestInstant> = SessionRegistry::new(10);
        let token = registry.try_register(session(1, Duration::ZERO)).unwrap();
        let timed_out = registry.sweep_timeouts(Duration::from_secs(120));
        assert_eq!(timed_out, vec![1]);
        assert!(token.is_cancelled());
    }
}
