//! Cryptographic functions for the expense tracker
//!
//! Provides salted Argon2id password hashing for the credential store and a
//! zeroizing holder for passwords read from the terminal.

pub mod password;
pub mod secure_memory;

pub use password::{hash_password, verify_password, PasswordHashParams};
pub use secure_memory::SecretPassword;
