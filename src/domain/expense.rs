use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Amount};

pub type ExpenseId = Uuid;

/// Longest category label accepted, in characters.
pub const MAX_CATEGORY_LEN: usize = 64;

/// Longest free-text description accepted, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 512;

/// A single dated spending record.
/// Expenses are immutable once stored; the only way to change one is to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Insertion order within the store, assigned on save
    pub sequence: i64,
    /// Owning account; never changes
    pub owner_id: AccountId,
    pub amount: Amount,
    /// Free-text grouping label (e.g., "food", "transport")
    pub category: String,
    pub description: Option<String>,
    /// Calendar day the money was spent
    pub date: NaiveDate,
    /// When the expense was recorded
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Create a new expense. Sequence number must be assigned by the store.
    pub fn new(
        owner_id: AccountId,
        amount: Amount,
        category: impl Into<String>,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            owner_id,
            amount,
            category: category.into(),
            description: None,
            date,
            created_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Listing order: date descending, then creation time descending, then
/// insertion sequence descending. Every store must return this order.
pub fn newest_first(a: &Expense, b: &Expense) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.sequence.cmp(&a.sequence))
}

/// Normalize a category label: trimmed, non-empty, bounded.
pub fn normalize_category(category: &str) -> Result<String, &'static str> {
    let category = category.trim();
    if category.is_empty() {
        return Err("category must not be empty");
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err("category is too long");
    }
    Ok(category.to_string())
}

/// Normalize an optional description. Blank text becomes `None`.
pub fn normalize_description(description: Option<&str>) -> Result<Option<String>, &'static str> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => {
            Err("description is too long")
        }
        Some(text) => Ok(Some(text.to_string())),
    }
}
