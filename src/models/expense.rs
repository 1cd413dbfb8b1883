//! Expense model
//!
//! An expense is immutable once recorded. Its id is unique only within the
//! owning user's list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user sequential expense identifier, starting at 1
pub type ExpenseId = u64;

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Sequential id within the owner's ledger
    pub id: ExpenseId,

    /// Free-form description
    pub description: String,

    /// Amount spent; sign is not constrained
    pub amount: f64,

    /// Free-form category label
    pub category: String,
}

impl Expense {
    /// Build a stored record from an id and its input
    pub fn from_new(id: ExpenseId, new: NewExpense) -> Self {
        Self {
            id,
            description: new.description,
            amount: new.amount,
            category: new.category,
        }
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}) {:.2}",
            self.id, self.description, self.category, self.amount
        )
    }
}

/// Input for recording a new expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
}

impl NewExpense {
    pub fn new(description: impl Into<String>, amount: f64, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount,
            category: category.into(),
        }
    }
}
