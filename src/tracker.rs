//! Expense tracker facade
//!
//! [`ExpenseTracker`] owns the credential store, the expense ledger and the
//! session manager. Both access surfaces (the console and the HTTP API) hold
//! the same `Arc<ExpenseTracker>`; each store carries its own lock, so the
//! tracker itself needs no outer lock.

use crate::config::{paths::ExpensePaths, settings::Settings};
use crate::error::ExpenseResult;
use crate::models::{Expense, NewExpense};
use crate::reports::ExpenseReport;
use crate::session::{SessionManager, SessionState};
use crate::storage::Storage;

/// Shared process state for the expense tracker
pub struct ExpenseTracker {
    storage: Storage,
    sessions: SessionManager,
}

impl ExpenseTracker {
    /// Load both stores from disk and start with every user logged out
    pub fn open(paths: ExpensePaths, settings: &Settings) -> ExpenseResult<Self> {
        let storage = Storage::new(paths, settings)?;
        storage.load_all()?;
        Ok(Self::from_storage(storage))
    }

    /// Wrap an already loaded storage
    pub fn from_storage(storage: Storage) -> Self {
        Self {
            storage,
            sessions: SessionManager::new(),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Register a new user
    pub fn register(&self, username: &str, password: &str) -> ExpenseResult<()> {
        self.storage.credentials.register(username, password)
    }

    /// Check if a username is taken
    pub fn user_exists(&self, username: &str) -> ExpenseResult<bool> {
        self.storage.credentials.contains(username)
    }

    /// Open a session, with the failure reason on error
    pub fn try_login(&self, username: &str, password: &str) -> ExpenseResult<()> {
        self.sessions
            .try_login(&self.storage.credentials, username, password)
    }

    /// Open a session; false on bad credentials or an existing session
    pub fn login(&self, username: &str, password: &str) -> ExpenseResult<bool> {
        self.sessions
            .login(&self.storage.credentials, username, password)
    }

    /// Close a session, failing if none is open
    pub fn try_logout(&self, username: &str) -> ExpenseResult<()> {
        self.sessions.try_logout(username)
    }

    /// Close a session; false if none was open
    pub fn logout(&self, username: &str) -> ExpenseResult<bool> {
        self.sessions.logout(username)
    }

    pub fn is_logged_in(&self, username: &str) -> ExpenseResult<bool> {
        self.sessions.is_logged_in(username)
    }

    pub fn session_state(&self, username: &str) -> ExpenseResult<SessionState> {
        self.sessions.state(username)
    }

    /// Record an expense for a logged-in user
    pub fn add_expense(&self, username: &str, new: NewExpense) -> ExpenseResult<Expense> {
        self.sessions.require(username)?;
        self.storage.expenses.add_expense(username, new)
    }

    /// A logged-in user's expenses in insertion order
    pub fn expenses(&self, username: &str) -> ExpenseResult<Vec<Expense>> {
        self.sessions.require(username)?;
        self.storage.expenses.list_expenses(username)
    }

    /// A logged-in user's total spending
    pub fn total(&self, username: &str) -> ExpenseResult<f64> {
        self.sessions.require(username)?;
        self.storage.expenses.total_for(username)
    }

    /// A logged-in user's expense report
    pub fn report(&self, username: &str) -> ExpenseResult<ExpenseReport> {
        self.sessions.require(username)?;
        ExpenseReport::generate(&self.storage.expenses, username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PasswordHashParams;
    use crate::error::ExpenseError;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn cheap_settings() -> Settings {
        Settings {
            password_hash: PasswordHashParams::with_values(64, 1, 1),
            ..Settings::default()
        }
    }

    fn open(temp_dir: &TempDir) -> ExpenseTracker {
        let paths = ExpensePaths::with_base_dir(temp_dir.path().to_path_buf());
        ExpenseTracker::open(paths, &cheap_settings()).unwrap()
    }

    #[test]
    fn test_full_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = open(&temp_dir);

        tracker.register("alice", "pw1").unwrap();
        assert!(tracker.login("alice", "pw1").unwrap());

        let coffee = tracker
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap();
        let bus = tracker
            .add_expense("alice", NewExpense::new("bus", 2.0, "transport"))
            .unwrap();
        assert_eq!(coffee.id, 1);
        assert_eq!(bus.id, 2);

        let report = tracker.report("alice").unwrap();
        assert_eq!(report.total_expenses, 5.5);
        assert_eq!(report.expenses_by_category.len(), 2);
        assert_eq!(report.expenses_by_category["food"], 3.5);
        assert_eq!(report.expenses_by_category["transport"], 2.0);
        assert_eq!(tracker.total("alice").unwrap(), 5.5);
    }

    #[test]
    fn test_data_operations_require_session() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = open(&temp_dir);
        tracker.register("alice", "pw1").unwrap();

        let err = tracker
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::NotLoggedIn { .. }));
        assert!(tracker.report("alice").is_err());
        assert!(tracker.total("alice").is_err());
        assert!(tracker.expenses("alice").is_err());

        tracker.login("alice", "pw1").unwrap();
        tracker.logout("alice").unwrap();
        assert!(tracker.report("alice").is_err());
    }

    #[test]
    fn test_wrong_password_keeps_logged_out() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = open(&temp_dir);
        tracker.register("alice", "pw1").unwrap();

        assert!(!tracker.login("alice", "wrong").unwrap());
        assert_eq!(tracker.session_state("alice").unwrap(), SessionState::LoggedOut);
    }

    #[test]
    fn test_restart_keeps_data_but_not_sessions() {
        let temp_dir = TempDir::new().unwrap();
        {
            let tracker = open(&temp_dir);
            tracker.register("alice", "pw1").unwrap();
            tracker.login("alice", "pw1").unwrap();
            tracker
                .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
                .unwrap();
        }

        let tracker = open(&temp_dir);
        assert!(tracker.user_exists("alice").unwrap());
        assert!(!tracker.is_logged_in("alice").unwrap());

        assert!(tracker.login("alice", "pw1").unwrap());
        let next = tracker
            .add_expense("alice", NewExpense::new("bus", 2.0, "transport"))
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_corrupt_expense_file_at_startup() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ExpensePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        fs::write(paths.expenses_file(), "[[[ not json").unwrap();

        let tracker = open(&temp_dir);
        tracker.register("alice", "pw1").unwrap();
        tracker.login("alice", "pw1").unwrap();
        let expense = tracker
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap();
        assert_eq!(expense.id, 1);
    }

    #[test]
    fn test_corrupt_credential_file_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ExpensePaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        fs::write(paths.users_file(), "{").unwrap();

        let result = ExpenseTracker::open(paths, &cheap_settings());
        assert!(matches!(result, Err(ExpenseError::Corrupt { .. })));
    }

    #[test]
    fn test_report_never_sees_partial_adds() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = Arc::new(open(&temp_dir));
        tracker.register("alice", "pw1").unwrap();
        tracker.login("alice", "pw1").unwrap();

        let writer = {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for i in 0..50 {
                    let category = if i % 2 == 0 { "food" } else { "transport" };
                    tracker
                        .add_expense("alice", NewExpense::new("item", 1.25, category))
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            let report = tracker.report("alice").unwrap();
            let category_sum: f64 = report.expenses_by_category.values().sum();
            assert_eq!(report.total_expenses, category_sum);
        }

        writer.join().unwrap();
        assert_eq!(tracker.total("alice").unwrap(), 62.5);
    }
}
