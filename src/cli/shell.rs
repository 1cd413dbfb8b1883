//! Interactive console
//!
//! A menu loop over an [`ExpenseTracker`]: register or log in first, then
//! add expenses and view totals and reports. Input and output are generic so
//! the loop can be driven from a script or a test as well as a terminal.

use std::io::{BufRead, Write};

use crate::config::settings::Settings;
use crate::crypto::SecretPassword;
use crate::display::{format_money, format_report, format_total};
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::NewExpense;
use crate::tracker::ExpenseTracker;

const AUTH_CHOICES: &[&str] = &["1", "2", "3"];
const MENU_CHOICES: &[&str] = &["1", "2", "3", "4", "5"];

/// What the loop should do after handling one menu selection
enum Flow {
    Continue,
    Exit,
}

/// Interactive menu loop
pub struct Shell<'a, R, W> {
    tracker: &'a ExpenseTracker,
    currency: String,
    input: R,
    output: W,
    hidden_passwords: bool,
    current_user: Option<String>,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Create a shell reading from `input` and writing to `output`
    ///
    /// Passwords are read from `input` like any other answer; call
    /// [`Shell::hidden_passwords`] to read them from the terminal without echo.
    pub fn new(tracker: &'a ExpenseTracker, settings: &Settings, input: R, output: W) -> Self {
        Self {
            tracker,
            currency: settings.currency_symbol.clone(),
            input,
            output,
            hidden_passwords: false,
            current_user: None,
        }
    }

    /// Read passwords with terminal echo disabled
    pub fn hidden_passwords(mut self, hidden: bool) -> Self {
        self.hidden_passwords = hidden;
        self
    }

    /// The user logged in through this shell, if any
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Run until the user exits or input ends
    ///
    /// A user still logged in when the loop ends is logged out, also when it
    /// ends with an error.
    pub fn run(&mut self) -> ExpenseResult<()> {
        let result = self.menu_loop();

        let logout = match self.current_user.take() {
            Some(user) => self.tracker.logout(&user).map(|_| ()),
            None => Ok(()),
        };

        result?;
        logout?;
        writeln!(self.output, "Exiting...")?;
        Ok(())
    }

    fn menu_loop(&mut self) -> ExpenseResult<()> {
        loop {
            let flow = match self.current_user.clone() {
                None => self.auth_menu()?,
                Some(user) => self.expense_menu(&user)?,
            };

            if let Flow::Exit = flow {
                return Ok(());
            }
        }
    }

    fn auth_menu(&mut self) -> ExpenseResult<Flow> {
        writeln!(self.output)?;
        writeln!(self.output, "Authentication:")?;
        writeln!(self.output, "[1] Register")?;
        writeln!(self.output, "[2] Login")?;
        writeln!(self.output, "[3] Exit")?;

        let Some(choice) = self.prompt_choice("Choose an option (1-3)", AUTH_CHOICES)? else {
            return Ok(Flow::Exit);
        };

        match choice.as_str() {
            "1" => self.register(),
            "2" => self.login(),
            _ => Ok(Flow::Exit),
        }
    }

    fn register(&mut self) -> ExpenseResult<Flow> {
        let Some(username) = self.prompt_nonempty("Enter username")? else {
            return Ok(Flow::Exit);
        };

        if self.tracker.user_exists(&username)? {
            writeln!(self.output, "Username '{}' already exists. Please try again.", username)?;
            return Ok(Flow::Continue);
        }

        let Some(password) = self.prompt_password("Enter password")? else {
            return Ok(Flow::Exit);
        };

        match self.tracker.register(&username, password.expose()) {
            Ok(()) => {
                writeln!(self.output, "User '{}' registered successfully!", username)?;
            }
            Err(ExpenseError::AlreadyExists { .. }) => {
                writeln!(self.output, "Username '{}' already exists. Please try again.", username)?;
            }
            Err(e) => {
                writeln!(self.output, "Registration failed: {}", e)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn login(&mut self) -> ExpenseResult<Flow> {
        let Some(username) = self.prompt("Enter username")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt_password("Enter password")? else {
            return Ok(Flow::Exit);
        };

        if self.tracker.login(&username, password.expose())? {
            writeln!(self.output, "User '{}' logged in successfully!", username)?;
            self.current_user = Some(username);
        } else {
            writeln!(self.output, "Invalid credentials or already logged in.")?;
        }
        Ok(Flow::Continue)
    }

    fn expense_menu(&mut self, user: &str) -> ExpenseResult<Flow> {
        writeln!(self.output)?;
        writeln!(self.output, "Expense Tracker Menu for {}:", user)?;
        writeln!(self.output, "[1] Add Expense")?;
        writeln!(self.output, "[2] View Total Expenses")?;
        writeln!(self.output, "[3] Generate Report")?;
        writeln!(self.output, "[4] Logout")?;
        writeln!(self.output, "[5] Exit")?;

        let Some(choice) = self.prompt_choice("Choose an option (1-5)", MENU_CHOICES)? else {
            return Ok(Flow::Exit);
        };

        let result = match choice.as_str() {
            "1" => self.add_expense(user),
            "2" => self.show_total(user),
            "3" => self.show_report(user),
            "4" => {
                self.tracker.logout(user)?;
                self.current_user = None;
                writeln!(self.output, "Logged out.")?;
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Exit),
        };

        match result {
            // Someone closed the session from the other surface
            Err(ExpenseError::NotLoggedIn { .. }) => {
                self.current_user = None;
                writeln!(self.output, "Your session has ended. Please log in again.")?;
                Ok(Flow::Continue)
            }
            Err(e) if !matches!(e, ExpenseError::Io(_)) => {
                writeln!(self.output, "Error: {}", e)?;
                Ok(Flow::Continue)
            }
            other => other,
        }
    }

    fn add_expense(&mut self, user: &str) -> ExpenseResult<Flow> {
        let Some(description) = self.prompt("Enter expense description")? else {
            return Ok(Flow::Exit);
        };
        let Some(amount) = self.prompt_amount("Enter expense amount")? else {
            return Ok(Flow::Exit);
        };
        let Some(category) = self.prompt("Enter expense category")? else {
            return Ok(Flow::Exit);
        };

        let expense = self
            .tracker
            .add_expense(user, NewExpense::new(description, amount, category))?;

        writeln!(
            self.output,
            "Added Expense #{}: Description: {}, Amount: {}, Category: {}",
            expense.id,
            expense.description,
            format_money(expense.amount, &self.currency),
            expense.category
        )?;
        Ok(Flow::Continue)
    }

    fn show_total(&mut self, user: &str) -> ExpenseResult<Flow> {
        let total = self.tracker.total(user)?;
        writeln!(self.output, "{}", format_total(total, &self.currency))?;
        Ok(Flow::Continue)
    }

    fn show_report(&mut self, user: &str) -> ExpenseResult<Flow> {
        let report = self.tracker.report(user)?;
        writeln!(self.output, "{}", format_report(&report, &self.currency))?;
        Ok(Flow::Continue)
    }

    /// Print `message` and read one line; `None` once input is exhausted
    fn prompt(&mut self, message: &str) -> ExpenseResult<Option<String>> {
        write!(self.output, "{}: ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt_nonempty(&mut self, message: &str) -> ExpenseResult<Option<String>> {
        loop {
            match self.prompt(message)? {
                Some(answer) if answer.trim().is_empty() => {
                    writeln!(self.output, "A value is required.")?;
                }
                other => return Ok(other),
            }
        }
    }

    fn prompt_choice(&mut self, message: &str, choices: &[&str]) -> ExpenseResult<Option<String>> {
        loop {
            let Some(answer) = self.prompt(message)? else {
                return Ok(None);
            };

            let answer = answer.trim();
            if choices.contains(&answer) {
                return Ok(Some(answer.to_string()));
            }
            writeln!(self.output, "Please select one of the available options: {}", choices.join(", "))?;
        }
    }

    fn prompt_amount(&mut self, message: &str) -> ExpenseResult<Option<f64>> {
        loop {
            let Some(answer) = self.prompt(message)? else {
                return Ok(None);
            };

            match answer.trim().parse::<f64>() {
                Ok(amount) if amount.is_finite() => return Ok(Some(amount)),
                _ => writeln!(self.output, "Please enter a valid number.")?,
            }
        }
    }

    fn prompt_password(&mut self, message: &str) -> ExpenseResult<Option<SecretPassword>> {
        if !self.hidden_passwords {
            return Ok(self.prompt(message)?.map(SecretPassword::from));
        }

        self.output.flush()?;
        rpassword::prompt_password(format!("{}: ", message))
            .map(|p| Some(SecretPassword::from(p)))
            .map_err(|e| ExpenseError::Io(format!("Failed to read password: {}", e)))
    }
}
