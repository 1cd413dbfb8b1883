//! Storage layer for the expense tracker
//!
//! Two JSON files, each holding the entire store it mirrors and rewritten
//! atomically on every mutation. Both are loaded once at startup.

pub mod credentials;
pub mod expenses;
pub mod file_io;

pub use credentials::{CredentialStore, UserRecord};
pub use expenses::ExpenseLedger;
pub use file_io::{read_json, write_json_atomic};

use crate::config::{paths::ExpensePaths, settings::Settings};
use crate::error::ExpenseError;

/// Main storage coordinator that owns both file-backed stores
pub struct Storage {
    paths: ExpensePaths,
    pub credentials: CredentialStore,
    pub expenses: ExpenseLedger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: ExpensePaths, settings: &Settings) -> Result<Self, ExpenseError> {
        paths.ensure_directories()?;

        Ok(Self {
            credentials: CredentialStore::new(paths.users_file(), settings.password_hash),
            expenses: ExpenseLedger::new(paths.expenses_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &ExpensePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), ExpenseError> {
        self.credentials.load()?;
        self.expenses.load()?;
        Ok(())
    }
}
