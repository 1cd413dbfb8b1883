//! Expense Report
//!
//! Total spending and spending per category for one user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ExpenseResult;
use crate::models::Expense;
use crate::storage::ExpenseLedger;

/// Sum amounts grouped by category
pub fn by_category(expenses: &[Expense]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Sum of all amounts
///
/// Summed through the per-category totals so that a report's total is
/// exactly the sum of its category figures, with no rounding drift between
/// the two.
pub fn total(expenses: &[Expense]) -> f64 {
    sum_categories(&by_category(expenses))
}

// Starts from +0.0; `Iterator::sum` would give -0.0 for an empty map
fn sum_categories(totals: &BTreeMap<String, f64>) -> f64 {
    totals.values().fold(0.0, |acc, amount| acc + amount)
}

/// Expense report for a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReport {
    /// Total of all expenses
    pub total_expenses: f64,
    /// Total per category label
    pub expenses_by_category: BTreeMap<String, f64>,
}

impl ExpenseReport {
    /// Build a report from a list of expenses
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let expenses_by_category = by_category(expenses);
        let total_expenses = sum_categories(&expenses_by_category);
        Self {
            total_expenses,
            expenses_by_category,
        }
    }

    /// Generate the report for a user from one consistent view of the ledger
    pub fn generate(ledger: &ExpenseLedger, username: &str) -> ExpenseResult<Self> {
        ledger.with_expenses(username, Self::from_expenses)
    }

    /// Whether the report covers no expenses at all
    pub fn is_empty(&self) -> bool {
        self.expenses_by_category.is_empty()
    }
}
