//! Custom error types for the expense tracker
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for expense tracker operations
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage errors, including failed writes of a data file
    #[error("Storage error: {0}")]
    Storage(String),

    /// A data file exists but could not be parsed
    #[error("Corrupt data file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Registration of a username that is already taken
    #[error("User already exists: {username}")]
    AlreadyExists { username: String },

    /// Unknown user or wrong password; deliberately does not say which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login attempted while a session is already open
    #[error("User is already logged in: {username}")]
    AlreadyLoggedIn { username: String },

    /// Operation requires an open session
    #[error("User is not logged in: {username}")]
    NotLoggedIn { username: String },

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl ExpenseError {
    /// Create an "already exists" error for a username
    pub fn already_exists(username: impl Into<String>) -> Self {
        Self::AlreadyExists {
            username: username.into(),
        }
    }

    /// Create a "not logged in" error for a username
    pub fn not_logged_in(username: impl Into<String>) -> Self {
        Self::NotLoggedIn {
            username: username.into(),
        }
    }

    /// Create an "already logged in" error for a username
    pub fn already_logged_in(username: impl Into<String>) -> Self {
        Self::AlreadyLoggedIn {
            username: username.into(),
        }
    }

    /// Check if this is a corrupt-file error
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Check if this error comes from the login/logout state machine or
    /// credential checks rather than from storage
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::AlreadyLoggedIn { .. } | Self::NotLoggedIn { .. }
        )
    }
}

impl From<std::io::Error> for ExpenseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExpenseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for expense tracker operations
pub type ExpenseResult<T> = Result<T, ExpenseError>;
