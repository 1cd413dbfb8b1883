//! Core data models for the expense tracker
//!
//! Expense records as stored in the ledger and the input used to create them.

pub mod expense;

pub use expense::{Expense, ExpenseId, NewExpense};
