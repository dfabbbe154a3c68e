//! Per-connection session state machine.
//!
//! Pure logic: this module never touches a socket, a catalog, or the clock
//! directly. It is driven by an outer loop (see `cargohold-server`) that
//! reads a frame, calls into this state machine to gate and account for it,
//! then dispatches the command to the catalogs/engines that do the real
//! work and finally writes the response back.

use std::time::Duration;

use cargohold_proto::CommandCode;

use crate::error::SessionError;

/// Lifecycle state of one session, per the three states named by the
/// protocol: `AuthRequired`, `Authenticated`, `Disconnecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state. Only login and account creation are accepted.
    AuthRequired,
    /// Normal operating state after a successful login.
    Authenticated,
    /// Logout has been acknowledged; no further commands are processed and
    /// the connection is being torn down.
    Disconnecting,
}

/// Severity of a log action emitted by the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail, not normally surfaced to operators.
    Debug,
    /// Routine informational event.
    Info,
    /// Recoverable problem worth an operator's attention.
    Warn,
    /// Unexpected failure.
    Error,
}

/// Configuration for session-level timeouts.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Inactivity period after which the session manager disconnects this
    /// session (`SessionTimeoutMinutes` in the external configuration).
    pub session_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { session_timeout: Duration::from_secs(30 * 60) }
    }
}

/// One TCP connection's authentication state and activity clock.
///
/// Generic over the instant type so tests can drive a virtual clock instead
/// of `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct Session<I> {
    session_id: u64,
    user_id: Option<String>,
    state: SessionState,
    last_activity: I,
    config: SessionConfig,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> Session<I> {
    /// Creates a new session in `AuthRequired`, with activity reset to
    /// `now`.
    #[must_use]
    pub fn new(session_id: u64, now: I, config: SessionConfig) -> Self {
        Self { session_id, user_id: None, state: SessionState::AuthRequired, last_activity: now, config }
    }

    /// This session's id.
    #[must_use]
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Authenticated user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Records that a frame was received, resetting the idle clock.
    pub fn update_activity(&mut self, now: I) {
        self.last_activity = now;
    }

    /// How long this session has been idle as of `now`.
    #[must_use]
    pub fn idle_for(&self, now: I) -> Duration {
        now - self.last_activity
    }

    /// True if this session has been idle longer than its configured
    /// timeout and should be disconnected by the next sweep.
    #[must_use]
    pub fn has_timed_out(&self, now: I) -> bool {
        self.idle_for(now) > self.config.session_timeout
    }

    /// Validates that `command` is legal in the current state, per the
    /// transition table in the session state machine design.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if the session is `Disconnecting`.
    /// - [`SessionError::Unauthorized`] if the session is `AuthRequired` and
    ///   `command` is neither login nor account creation.
    /// - [`SessionError::AlreadyAuthenticated`] if the session is
    ///   `Authenticated` and `command` is login or account creation.
    pub fn gate(&self, command: i32) -> Result<(), SessionError> {
        match self.state {
            SessionState::Disconnecting => {
                Err(SessionError::InvalidState { state: self.state, command })
            },
            SessionState::AuthRequired => {
                if CommandCode::requires_authentication(command) {
                    Err(SessionError::Unauthorized { command })
                } else {
                    Ok(())
                }
            },
            SessionState::Authenticated => {
                if CommandCode::requires_authentication(command) {
                    Ok(())
                } else {
                    Err(SessionError::AlreadyAuthenticated { command })
                }
            },
        }
    }

    /// Enforces the authorization rule: a non-empty packet `user_id` must
    /// match the session's authenticated user id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthorizationMismatch`] on mismatch. A packet
    /// with an empty `user_id` always passes, since the session's own
    /// identity is authoritative once authenticated.
    pub fn authorize(&self, packet_user_id: &str) -> Result<(), SessionError> {
        if packet_user_id.is_empty() {
            return Ok(());
        }
        match &self.user_id {
            Some(session_user) if session_user == packet_user_id => Ok(()),
            _ => Err(SessionError::AuthorizationMismatch),
        }
    }

    /// Transitions to `Authenticated` on a successful login or account
    /// creation, recording `user_id`.
    pub fn authenticate(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
        self.state = SessionState::Authenticated;
    }

    /// Transitions to `Disconnecting` after a logout response has been
    /// queued for send.
    pub fn begin_disconnect(&mut self) {
        self.state = SessionState::Disconnecting;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    type TestInstant = Duration;

    fn session_at(now: TestInstant) -> Session<TestInstant> {
        Session::new(1, now, SessionConfig { session_timeout: Duration::from_secs(60) })
    }

    #[test]
    fn auth_required_accepts_only_login_and_create_account() {
        let session = session_at(Duration::ZERO);
        assert!(session.gate(CommandCode::LOGIN_REQUEST).is_ok());
        assert!(session.gate(CommandCode::CREATE_ACCOUNT_REQUEST).is_ok());
        assert!(matches!(
            session.gate(CommandCode::FILE_LIST_REQUEST),
            Err(SessionError::Unauthorized { command }) if command == CommandCode::FILE_LIST_REQUEST
        ));
    }

    #[test]
    fn authenticated_rejects_login_and_create_account() {
        let mut session = session_at(Duration::ZERO);
        session.authenticate("alice");
        assert!(matches!(
            session.gate(CommandCode::LOGIN_REQUEST),
            Err(SessionError::AlreadyAuthenticated { .. })
        ));
        assert!(session.gate(CommandCode::FILE_LIST_REQUEST).is_ok());
    }

    #[test]
    fn disconnecting_rejects_everything() {
        let mut session = session_at(Duration::ZERO);
        session.authenticate("alice");
        session.begin_disconnect();
        assert!(matches!(
            session.gate(CommandCode::FILE_LIST_REQUEST),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn authorize_requires_matching_user_id_when_present() {
        let mut session = session_at(Duration::ZERO);
        session.authenticate("alice");
        assert!(session.authorize("").is_ok());
        assert!(session.authorize("alice").is_ok());
        assert!(matches!(session.authorize("mallory"), Err(SessionError::AuthorizationMismatch)));
    }

    #[test]
    fn timeout_fires_after_configured_duration() {
        let mut session = session_at(Duration::ZERO);
        session.update_activity(Duration::from_secs(10));
        assert!(!session.has_timed_out(Duration::from_secs(69)));
        assert!(session.has_timed_out(Duration::from_secs(71)));
    }
}
