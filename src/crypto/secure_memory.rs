//! Secure memory handling for passwords
//!
//! Passwords typed at the console live in a [`SecretPassword`] so the
//! plaintext is wiped when it goes out of scope.

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A password string that zeros its contents on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretPassword {
    inner: String,
}

impl SecretPassword {
    /// Wrap a plaintext password
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Get the plaintext
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Deref for SecretPassword {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<String> for SecretPassword {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretPassword {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for SecretPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPassword")
            .field("len", &self.inner.len())
            .finish()
    }
}
