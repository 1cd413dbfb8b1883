//! Expense ledger for JSON storage
//!
//! Keeps every user's expenses in insertion order together with the next id
//! to hand out, persisted to expenses.json as
//! `{ "<username>": [ { "id", "description", "amount", "category" }, ... ] }`.
//!
//! Every addition rewrites the whole file, so an add costs O(total expenses
//! across all users).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{Expense, ExpenseId, NewExpense};
use crate::reports;

use super::file_io::{read_json, write_json_atomic};

type ExpenseData = BTreeMap<String, Vec<Expense>>;

#[derive(Debug, Default)]
struct LedgerState {
    expenses: ExpenseData,
    /// Next id per user; one past the highest id ever assigned
    next_id: HashMap<String, ExpenseId>,
}

impl LedgerState {
    /// Rebuild the id counters from loaded data
    ///
    /// An id of `u64::MAX` leaves no next id to hand out, so the file is
    /// reported as corrupt.
    fn from_data(expenses: ExpenseData, path: &Path) -> ExpenseResult<Self> {
        let next_id = expenses
            .iter()
            .map(|(user, list)| {
                let max = list.iter().map(|e| e.id).max().unwrap_or(0);
                let next = max.checked_add(1).ok_or_else(|| ExpenseError::Corrupt {
                    path: path.display().to_string(),
                    reason: format!("expense id {} for user '{}' is out of range", max, user),
                })?;
                Ok((user.clone(), next))
            })
            .collect::<ExpenseResult<HashMap<_, _>>>()?;

        Ok(Self { expenses, next_id })
    }
}

/// Repository for expense persistence and per-user id assignment
pub struct ExpenseLedger {
    path: PathBuf,
    state: RwLock<LedgerState>,
}

impl ExpenseLedger {
    /// Create an empty ledger backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Load expenses from disk
    ///
    /// A malformed file does not fail the load: it is copied aside to
    /// `expenses.json.corrupt`, a warning is logged and the ledger starts
    /// empty. Other I/O errors are returned.
    pub fn load(&self) -> ExpenseResult<()> {
        let loaded = read_json(&self.path).and_then(|data| LedgerState::from_data(data, &self.path));
        let new_state = match loaded {
            Ok(state) => state,
            Err(e) if e.is_corrupt() => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Error loading expenses, starting with an empty ledger"
                );
                self.preserve_corrupt_file();
                LedgerState::default()
            }
            Err(e) => return Err(e),
        };

        let mut state = self.write()?;
        *state = new_state;

        tracing::debug!(
            users = state.expenses.len(),
            path = %self.path.display(),
            "Loaded expenses"
        );
        Ok(())
    }

    fn preserve_corrupt_file(&self) {
        let backup = self.path.with_extension("json.corrupt");
        if let Err(e) = fs::copy(&self.path, &backup) {
            tracing::warn!(error = %e, "Could not keep a copy of the corrupt expense file");
        } else {
            tracing::info!(backup = %backup.display(), "Kept a copy of the corrupt expense file");
        }
    }

    /// Record an expense for `username` and return it with its assigned id
    ///
    /// Ids start at 1 per user and are never reused. The whole ledger is
    /// written to disk before this returns; if that write fails the addition
    /// is undone and the error returned.
    pub fn add_expense(&self, username: &str, new: NewExpense) -> ExpenseResult<Expense> {
        if !new.amount.is_finite() {
            return Err(ExpenseError::Validation(format!(
                "Amount must be a finite number, got {}",
                new.amount
            )));
        }

        let mut state = self.write()?;

        let id = *state.next_id.entry(username.to_string()).or_insert(1);
        let next = id.checked_add(1).ok_or_else(|| {
            ExpenseError::Validation(format!("No expense ids left for user '{}'", username))
        })?;
        let expense = Expense::from_new(id, new);
        state
            .expenses
            .entry(username.to_string())
            .or_default()
            .push(expense.clone());
        state.next_id.insert(username.to_string(), next);

        if let Err(e) = write_json_atomic(&self.path, &state.expenses) {
            Self::undo_add(&mut *state, username, id);
            tracing::error!(username, error = %e, "Failed to persist expense");
            return Err(e);
        }

        tracing::debug!(username, id, "Recorded expense");
        Ok(expense)
    }

    fn undo_add(state: &mut LedgerState, username: &str, id: ExpenseId) {
        let now_empty = match state.expenses.get_mut(username) {
            Some(list) => {
                list.pop();
                list.is_empty()
            }
            None => false,
        };

        if now_empty && id == 1 {
            state.expenses.remove(username);
            state.next_id.remove(username);
        } else {
            state.next_id.insert(username.to_string(), id);
        }
    }

    /// All expenses for a user in the order they were added
    pub fn list_expenses(&self, username: &str) -> ExpenseResult<Vec<Expense>> {
        self.with_expenses(username, <[Expense]>::to_vec)
    }

    /// Sum of all of a user's expenses; 0 for unknown users
    pub fn total_for(&self, username: &str) -> ExpenseResult<f64> {
        self.with_expenses(username, reports::total)
    }

    /// Sum of a user's expenses per category; empty for unknown users
    pub fn category_breakdown(&self, username: &str) -> ExpenseResult<BTreeMap<String, f64>> {
        self.with_expenses(username, reports::by_category)
    }

    /// Run `f` over a user's expenses while holding the read lock
    ///
    /// Everything `f` sees comes from one consistent state; no addition can
    /// land part-way through.
    pub fn with_expenses<T>(&self, username: &str, f: impl FnOnce(&[Expense]) -> T) -> ExpenseResult<T> {
        let state = self.read()?;
        let list = state
            .expenses
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(f(list))
    }

    /// Users with at least one recorded expense, sorted
    pub fn usernames(&self) -> ExpenseResult<Vec<String>> {
        Ok(self.read()?.expenses.keys().cloned().collect())
    }

    /// Next id that would be assigned to `username`
    pub fn next_id(&self, username: &str) -> ExpenseResult<ExpenseId> {
        Ok(self.read()?.next_id.get(username).copied().unwrap_or(1))
    }

    fn read(&self) -> ExpenseResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ExpenseResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_ledger() -> (TempDir, ExpenseLedger) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("expenses.json");
        let ledger = ExpenseLedger::new(path);
        (temp_dir, ledger)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, ledger) = create_test_ledger();
        ledger.load().unwrap();
        assert!(ledger.usernames().unwrap().is_empty());
    }

    #[test]
    fn test_sequential_ids() {
        let (_temp_dir, ledger) = create_test_ledger();

        let first = ledger
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap();
        let second = ledger
            .add_expense("alice", NewExpense::new("bus", 2.0, "transport"))
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(ledger.next_id("alice").unwrap(), 3);
    }

    #[test]
    fn test_ids_are_per_user() {
        let (_temp_dir, ledger) = create_test_ledger();

        let a1 = ledger.add_expense("alice", NewExpense::new("a", 1.0, "x")).unwrap();
        let b1 = ledger.add_expense("bob", NewExpense::new("b", 1.0, "x")).unwrap();
        let a2 = ledger.add_expense("alice", NewExpense::new("c", 1.0, "x")).unwrap();
        let b2 = ledger.add_expense("bob", NewExpense::new("d", 1.0, "x")).unwrap();

        assert_eq!((a1.id, a2.id), (1, 2));
        assert_eq!((b1.id, b2.id), (1, 2));
    }

    #[test]
    fn test_unknown_user_defaults() {
        let (_temp_dir, ledger) = create_test_ledger();
        ledger.load().unwrap();

        assert_eq!(ledger.total_for("nobody").unwrap(), 0.0);
        assert!(ledger.category_breakdown("nobody").unwrap().is_empty());
        assert!(ledger.list_expenses("nobody").unwrap().is_empty());
        assert_eq!(ledger.next_id("nobody").unwrap(), 1);
    }

    #[test]
    fn test_totals_and_breakdown() {
        let (_temp_dir, ledger) = create_test_ledger();
        ledger.add_expense("alice", NewExpense::new("coffee", 3.5, "food")).unwrap();
        ledger.add_expense("alice", NewExpense::new("bus", 2.0, "transport")).unwrap();
        ledger.add_expense("alice", NewExpense::new("lunch", 10.0, "food")).unwrap();
        ledger.add_expense("bob", NewExpense::new("rent", 500.0, "housing")).unwrap();

        assert_eq!(ledger.total_for("alice").unwrap(), 15.5);

        let breakdown = ledger.category_breakdown("alice").unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown["food"], 13.5);
        assert_eq!(breakdown["transport"], 2.0);
    }

    #[test]
    fn test_negative_amounts_accepted() {
        let (_temp_dir, ledger) = create_test_ledger();
        ledger.add_expense("alice", NewExpense::new("refund", -4.0, "food")).unwrap();
        ledger.add_expense("alice", NewExpense::new("meal", 10.0, "food")).unwrap();

        assert_eq!(ledger.total_for("alice").unwrap(), 6.0);
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        let (_temp_dir, ledger) = create_test_ledger();

        let err = ledger
            .add_expense("alice", NewExpense::new("bad", f64::NAN, "x"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Validation(_)));
        assert_eq!(ledger.next_id("alice").unwrap(), 1);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let (_temp_dir, ledger) = create_test_ledger();
        for name in ["c", "a", "b"] {
            ledger.add_expense("alice", NewExpense::new(name, 1.0, "x")).unwrap();
        }

        let names: Vec<_> = ledger
            .list_expenses("alice")
            .unwrap()
            .into_iter()
            .map(|e| e.description)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, ledger) = create_test_ledger();
        ledger.add_expense("alice", NewExpense::new("coffee", 3.5, "food")).unwrap();
        ledger.add_expense("alice", NewExpense::new("bus", 2.0, "transport")).unwrap();
        ledger.add_expense("bob", NewExpense::new("rent", 500.0, "housing")).unwrap();

        let ledger2 = ExpenseLedger::new(temp_dir.path().join("expenses.json"));
        ledger2.load().unwrap();

        assert_eq!(ledger2.usernames().unwrap(), vec!["alice", "bob"]);
        assert_eq!(
            ledger.list_expenses("alice").unwrap(),
            ledger2.list_expenses("alice").unwrap()
        );
        assert_eq!(ledger2.next_id("alice").unwrap(), 3);

        // Ids continue after a restart
        let next = ledger2.add_expense("alice", NewExpense::new("tea", 2.5, "food")).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_load_resumes_after_highest_id() {
        let (temp_dir, ledger) = create_test_ledger();
        fs::write(
            temp_dir.path().join("expenses.json"),
            r#"{"alice": [
                {"id": 1, "description": "a", "amount": 1.0, "category": "x"},
                {"id": 5, "description": "b", "amount": 2.0, "category": "x"}
            ]}"#,
        )
        .unwrap();

        ledger.load().unwrap();
        let next = ledger.add_expense("alice", NewExpense::new("c", 1.0, "x")).unwrap();
        assert_eq!(next.id, 6);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let (temp_dir, ledger) = create_test_ledger();
        let path = temp_dir.path().join("expenses.json");
        fs::write(&path, r#"{"alice": [{"id": 1, "descr"#).unwrap();

        ledger.load().unwrap();
        assert!(ledger.usernames().unwrap().is_empty());
        assert!(temp_dir.path().join("expenses.json.corrupt").exists());

        let expense = ledger.add_expense("alice", NewExpense::new("coffee", 3.5, "food")).unwrap();
        assert_eq!(expense.id, 1);

        // The rewrite replaced the corrupt file with a valid one
        let ledger2 = ExpenseLedger::new(path);
        ledger2.load().unwrap();
        assert_eq!(ledger2.list_expenses("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let ledger = ExpenseLedger::new(blocker.join("expenses.json"));

        let err = ledger
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Storage(_)));
        assert!(ledger.list_expenses("alice").unwrap().is_empty());
        assert!(ledger.usernames().unwrap().is_empty());
        assert_eq!(ledger.next_id("alice").unwrap(), 1);
    }

    #[test]
    fn test_reload_keeps_amounts_bit_exact() {
        let (temp_dir, ledger) = create_test_ledger();

        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut amounts = vec![0.1, 1.0 / 3.0, 23105646.448764842, f64::MIN_POSITIVE, -7.77e-12];
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            amounts.push((seed % 1_000_000_000) as f64 / 7.0 + (seed >> 40) as f64 * 1e-7);
        }
        for amount in &amounts {
            ledger.add_expense("alice", NewExpense::new("x", *amount, "misc")).unwrap();
        }

        let ledger2 = ExpenseLedger::new(temp_dir.path().join("expenses.json"));
        ledger2.load().unwrap();

        let reloaded = ledger2.list_expenses("alice").unwrap();
        assert_eq!(reloaded.len(), amounts.len());
        for (expense, amount) in reloaded.iter().zip(&amounts) {
            assert_eq!(expense.amount.to_bits(), amount.to_bits(), "amount {} changed", amount);
        }
        assert_eq!(
            ledger.total_for("alice").unwrap().to_bits(),
            ledger2.total_for("alice").unwrap().to_bits()
        );
    }

    #[test]
    fn test_out_of_range_id_is_treated_as_corrupt() {
        let (temp_dir, ledger) = create_test_ledger();
        fs::write(
            temp_dir.path().join("expenses.json"),
            r#"{"alice": [{"id": 18446744073709551615, "description": "a", "amount": 1.0, "category": "x"}]}"#,
        )
        .unwrap();

        ledger.load().unwrap();
        assert!(ledger.usernames().unwrap().is_empty());
        assert!(temp_dir.path().join("expenses.json.corrupt").exists());

        let expense = ledger.add_expense("alice", NewExpense::new("coffee", 3.5, "food")).unwrap();
        assert_eq!(expense.id, 1);
    }

    #[test]
    fn test_exhausted_ids_reject_add() {
        let (temp_dir, ledger) = create_test_ledger();
        fs::write(
            temp_dir.path().join("expenses.json"),
            r#"{"alice": [{"id": 18446744073709551614, "description": "a", "amount": 1.0, "category": "x"}]}"#,
        )
        .unwrap();

        ledger.load().unwrap();
        assert_eq!(ledger.next_id("alice").unwrap(), u64::MAX);

        let err = ledger
            .add_expense("alice", NewExpense::new("coffee", 3.5, "food"))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Validation(_)));
        assert_eq!(ledger.list_expenses("alice").unwrap().len(), 1);
        assert_eq!(ledger.next_id("alice").unwrap(), u64::MAX);
    }

    #[test]
    fn test_concurrent_adds_keep_ids_sequential() {
        let (_temp_dir, ledger) = create_test_ledger();
        let ledger = Arc::new(ledger);
        let per_thread = 10;

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let user = if t % 2 == 0 { "alice" } else { "bob" };
                    let mut ids = Vec::new();
                    for i in 0..per_thread {
                        let e = ledger
                            .add_expense(user, NewExpense::new(format!("e{}", i), 1.0, "x"))
                            .unwrap();
                        ids.push(e.id);
                    }
                    ids
                })
            })
            .collect();

        for handle in handles {
            let ids = handle.join().unwrap();
            // Each thread sees its own ids strictly increasing
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }

        for user in ["alice", "bob"] {
            let ids: Vec<_> = ledger
                .list_expenses(user)
                .unwrap()
                .into_iter()
                .map(|e| e.id)
                .collect();
            let expected: Vec<_> = (1..=2 * per_thread as u64).collect();
            assert_eq!(ids, expected);
        }
    }
}
