//! Credential repository for JSON storage
//!
//! Manages registration and password checks, persisted to users.json as
//! `{ "<username>": { "password": "<phc hash>" } }`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::crypto::password::{hash_password, verify_password, PasswordHashParams};
use crate::error::{ExpenseError, ExpenseResult};

use super::file_io::{read_json, write_json_atomic};

/// Stored credentials for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// PHC-formatted Argon2id hash
    pub password: String,
}

type CredentialData = BTreeMap<String, UserRecord>;

/// Repository for user credentials
pub struct CredentialStore {
    path: PathBuf,
    params: PasswordHashParams,
    data: RwLock<CredentialData>,
}

impl CredentialStore {
    /// Create an empty credential store backed by `path`
    pub fn new(path: PathBuf, params: PasswordHashParams) -> Self {
        Self {
            path,
            params,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load credentials from disk
    ///
    /// A missing file yields an empty store. A malformed file is reported as
    /// [`ExpenseError::Corrupt`] and the in-memory store is left untouched.
    pub fn load(&self) -> ExpenseResult<()> {
        let file_data: CredentialData = read_json(&self.path)?;

        let mut data = self.write()?;
        *data = file_data;

        tracing::debug!(users = data.len(), path = %self.path.display(), "Loaded credentials");
        Ok(())
    }

    /// Register a new user
    ///
    /// The store is written to disk before this returns. If the write fails
    /// the registration is undone and the error returned.
    pub fn register(&self, username: &str, password: &str) -> ExpenseResult<()> {
        if self.contains(username)? {
            return Err(ExpenseError::already_exists(username));
        }

        // Hash outside the lock; it is the slow part
        let hash = hash_password(password, &self.params)?;

        let mut data = self.write()?;
        if data.contains_key(username) {
            return Err(ExpenseError::already_exists(username));
        }

        data.insert(username.to_string(), UserRecord { password: hash });

        if let Err(e) = write_json_atomic(&self.path, &*data) {
            data.remove(username);
            tracing::error!(username, error = %e, "Failed to persist registration");
            return Err(e);
        }

        tracing::info!(username, "Registered user");
        Ok(())
    }

    /// Check a username/password pair
    ///
    /// Unknown users cost one hash computation like known ones, so timing
    /// does not reveal whether a username is registered.
    pub fn verify(&self, username: &str, password: &str) -> ExpenseResult<bool> {
        let stored = self.read()?.get(username).map(|r| r.password.clone());

        match stored {
            Some(hash) => Ok(verify_password(password, &hash)),
            None => {
                // Only the time spent matters; the hash and any error are discarded
                let _ = hash_password(password, &self.params);
                Ok(false)
            }
        }
    }

    /// Check if a username is registered
    pub fn contains(&self, username: &str) -> ExpenseResult<bool> {
        Ok(self.read()?.contains_key(username))
    }

    /// Number of registered users
    pub fn len(&self) -> ExpenseResult<usize> {
        Ok(self.read()?.len())
    }

    /// Check if no users are registered
    pub fn is_empty(&self) -> ExpenseResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Copy of the stored records
    pub fn snapshot(&self) -> ExpenseResult<BTreeMap<String, UserRecord>> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> ExpenseResult<RwLockReadGuard<'_, CredentialData>> {
        self.data
            .read()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ExpenseResult<RwLockWriteGuard<'_, CredentialData>> {
        self.data
            .write()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}
