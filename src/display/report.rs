//! Report formatting utilities for terminal output

use tabled::{settings::Style, Table, Tabled};

use crate::reports::ExpenseReport;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Total Amount")]
    amount: String,
}

/// Format an amount with a currency symbol and two decimals
///
/// Negative amounts put the sign before the symbol: `-$4.00`.
pub fn format_money(amount: f64, symbol: &str) -> String {
    if amount < 0.0 {
        format!("-{}{:.2}", symbol, -amount)
    } else {
        // `+ 0.0` folds -0.0 into 0.0
        format!("{}{:.2}", symbol, amount + 0.0)
    }
}

/// The one-line total shown under reports
pub fn format_total(total: f64, symbol: &str) -> String {
    format!("Total Expenses: {}", format_money(total, symbol))
}

/// Render an expense report as a category table followed by the total
pub fn format_report(report: &ExpenseReport, symbol: &str) -> String {
    let mut output = String::from("Expense Report\n");

    if report.is_empty() {
        output.push_str("No expenses recorded.\n");
    } else {
        let rows = report
            .expenses_by_category
            .iter()
            .map(|(category, amount)| CategoryRow {
                category: truncate(category, 40),
                amount: format_money(*amount, symbol),
            });
        output.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        output.push('\n');
    }

    output.push('\n');
    output.push_str(&format_total(report.total_expenses, symbol));
    output
}

/// Truncate a string to a maximum number of characters with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expense, NewExpense};

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(5.5, "$"), "$5.50");
        assert_eq!(format_money(-4.0, "$"), "-$4.00");
        assert_eq!(format_money(-0.0, "$"), "$0.00");
        assert_eq!(format_money(1234.567, "€"), "€1234.57");
    }

    #[test]
    fn test_format_report() {
        let expenses = vec![
            Expense::from_new(1, NewExpense::new("coffee", 3.5, "food")),
            Expense::from_new(2, NewExpense::new("bus", 2.0, "transport")),
        ];
        let report = ExpenseReport::from_expenses(&expenses);
        let output = format_report(&report, "$");

        assert!(output.contains("Category"));
        assert!(output.contains("food"));
        assert!(output.contains("$3.50"));
        assert!(output.contains("transport"));
        assert!(output.contains("$2.00"));
        assert!(output.ends_with("Total Expenses: $5.50"));
    }

    #[test]
    fn test_format_empty_report() {
        let report = ExpenseReport::from_expenses(&[]);
        let output = format_report(&report, "$");
        assert!(output.contains("No expenses recorded."));
        assert!(output.ends_with("Total Expenses: $0.00"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello World", 5), "He...");
        assert_eq!(truncate("Hi", 5), "Hi");
        assert_eq!(truncate("Test", 4), "Test");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
