//! Console front end
//!
//! The interactive menu loop that drives the tracker from a terminal.

pub mod shell;

pub use shell::Shell;
