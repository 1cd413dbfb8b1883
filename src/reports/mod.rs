//! Reports module for the expense tracker
//!
//! Pure aggregation over a user's expenses. Nothing here holds state; every
//! report is computed from the ledger at the time it is requested.

pub mod expense;

pub use expense::{by_category, total, ExpenseReport};
