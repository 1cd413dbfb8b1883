//! Expense tracker - per-user expenses with login sessions
//!
//! This library provides the core of a small expense tracker: a credential
//! store, an expense ledger, a session manager and reporting, all held in
//! memory and mirrored to JSON files on every change. An interactive console
//! and an HTTP API share one [`tracker::ExpenseTracker`] in the same process.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Password hashing
//! - `models`: Expense records
//! - `storage`: JSON-backed credential store and expense ledger
//! - `session`: Login state per user
//! - `reports`: Totals and per-category breakdowns
//! - `tracker`: The shared handle both front ends use
//! - `display`: Terminal formatting
//! - `cli`: Interactive console
//! - `api`: HTTP API
//!
//! # Example
//!
//! ```rust,ignore
//! use expense::config::{paths::ExpensePaths, settings::Settings};
//! use expense::models::NewExpense;
//! use expense::tracker::ExpenseTracker;
//!
//! let paths = ExpensePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let tracker = ExpenseTracker::open(paths, &settings)?;
//!
//! tracker.register("alice", "pw1")?;
//! tracker.login("alice", "pw1")?;
//! tracker.add_expense("alice", NewExpense::new("coffee", 3.5, "food"))?;
//! let report = tracker.report("alice")?;
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod reports;
pub mod session;
pub mod storage;
pub mod tracker;

pub use error::{ExpenseError, ExpenseResult};
pub use tracker::ExpenseTracker;
