//! Display formatting for terminal output
//!
//! Renders amounts and reports for the interactive console.

pub mod report;

pub use report::{format_money, format_report, format_total};
