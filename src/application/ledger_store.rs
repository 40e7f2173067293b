use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    AccountId, Amount, Expense, ExpenseId, normalize_category, normalize_description,
};
use crate::storage::ExpenseStore;

use super::AppError;
use super::clock::{SharedClock, now_micros};

/// Owner-scoped expense records.
///
/// Every operation takes the owner as an argument; callers must only pass an
/// id obtained from a verified session.
#[derive(Clone)]
pub struct LedgerStore {
    expenses: Arc<dyn ExpenseStore>,
    clock: SharedClock,
}

impl LedgerStore {
    pub fn new(expenses: Arc<dyn ExpenseStore>, clock: SharedClock) -> Self {
        Self { expenses, clock }
    }

    /// Record an expense. All checks run before the single write; `Amount`
    /// is non-negative by construction.
    pub async fn add(
        &self,
        owner: AccountId,
        amount: Amount,
        category: &str,
        description: Option<&str>,
        date: NaiveDate,
    ) -> Result<ExpenseId, AppError> {
        let category = normalize_category(category).map_err(AppError::validation)?;
        let description = normalize_description(description).map_err(AppError::validation)?;

        let mut expense = Expense::new(owner, amount, category, date, now_micros(&self.clock));
        if let Some(text) = description {
            expense = expense.with_description(text);
        }

        self.expenses.insert_expense(&mut expense).await?;

        info!(owner = %owner, expense_id = %expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense.id)
    }

    /// All of the owner's expenses, newest date first.
    pub async fn list(&self, owner: AccountId) -> Result<Vec<Expense>, AppError> {
        Ok(self.expenses.list_expenses(owner).await?)
    }

    /// Remove one expense. Another owner's expense is reported exactly like
    /// a missing one.
    pub async fn delete(&self, owner: AccountId, expense_id: ExpenseId) -> Result<(), AppError> {
        if !self.expenses.delete_expense(owner, expense_id).await? {
            return Err(AppError::NotFound(expense_id));
        }
        info!(owner = %owner, expense_id = %expense_id, "expense deleted");
        Ok(())
    }
}
