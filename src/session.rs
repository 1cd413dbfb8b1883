//! Session manager
//!
//! Tracks which users are logged in. Each username moves between
//! [`SessionState::LoggedOut`] and [`SessionState::LoggedIn`]; a user holds at
//! most one session and it lasts until logout or process exit. Sessions are
//! never written to disk.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{ExpenseError, ExpenseResult};
use crate::storage::CredentialStore;

/// Login state of one username
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn,
}

/// In-memory login state for all users
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session, reporting why it could not be opened
    ///
    /// Fails with [`ExpenseError::InvalidCredentials`] for an unknown user or
    /// a wrong password alike, and with [`ExpenseError::AlreadyLoggedIn`] if
    /// the user already has a session. Neither failure changes any state.
    pub fn try_login(
        &self,
        credentials: &CredentialStore,
        username: &str,
        password: &str,
    ) -> ExpenseResult<()> {
        // Verify before taking the lock; hashing is slow
        if !credentials.verify(username, password)? {
            tracing::warn!(username, "Login rejected: invalid credentials");
            return Err(ExpenseError::InvalidCredentials);
        }

        let mut sessions = self.lock()?;
        let state = sessions.entry(username.to_string()).or_default();
        if *state == SessionState::LoggedIn {
            tracing::warn!(username, "Login rejected: already logged in");
            return Err(ExpenseError::already_logged_in(username));
        }

        *state = SessionState::LoggedIn;
        tracing::info!(username, "User logged in");
        Ok(())
    }

    /// Open a session; true only on a LoggedOut -> LoggedIn transition
    pub fn login(
        &self,
        credentials: &CredentialStore,
        username: &str,
        password: &str,
    ) -> ExpenseResult<bool> {
        auth_outcome(self.try_login(credentials, username, password))
    }

    /// Close a session, failing with [`ExpenseError::NotLoggedIn`] if none is open
    pub fn try_logout(&self, username: &str) -> ExpenseResult<()> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(username) {
            Some(state) if *state == SessionState::LoggedIn => {
                *state = SessionState::LoggedOut;
                tracing::info!(username, "User logged out");
                Ok(())
            }
            _ => Err(ExpenseError::not_logged_in(username)),
        }
    }

    /// Close a session; true only on a LoggedIn -> LoggedOut transition
    pub fn logout(&self, username: &str) -> ExpenseResult<bool> {
        auth_outcome(self.try_logout(username))
    }

    /// Current state; unknown usernames are logged out
    pub fn state(&self, username: &str) -> ExpenseResult<SessionState> {
        Ok(self.lock()?.get(username).copied().unwrap_or_default())
    }

    pub fn is_logged_in(&self, username: &str) -> ExpenseResult<bool> {
        Ok(self.state(username)? == SessionState::LoggedIn)
    }

    /// Fail with [`ExpenseError::NotLoggedIn`] unless `username` has a session
    pub fn require(&self, username: &str) -> ExpenseResult<()> {
        if self.is_logged_in(username)? {
            Ok(())
        } else {
            Err(ExpenseError::not_logged_in(username))
        }
    }

    fn lock(&self) -> ExpenseResult<MutexGuard<'_, HashMap<String, SessionState>>> {
        self.sessions
            .lock()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire session lock: {}", e)))
    }
}

/// Collapse state-machine and credential failures to `false`
fn auth_outcome(result: ExpenseResult<()>) -> ExpenseResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_auth() => Ok(false),
        Err(e) => Err(e),
    }
}
