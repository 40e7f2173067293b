//! Input and output shapes of the facade operations.
//!
//! Inputs reject unknown fields on deserialization, so a malformed request
//! never reaches domain logic.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{AccountId, Amount, Expense, ExpenseId};

use super::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Username and password for register and login.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Unvalidated request to record an expense.
///
/// `amount` is decimal text ("12.50"); JSON numbers are accepted too and
/// converted to their text form. `date` is `YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewExpense {
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

/// A [`NewExpense`] whose amount and date parsed.
#[derive(Debug, Clone)]
pub struct ValidExpense {
    pub amount: Amount,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl NewExpense {
    pub fn new(
        amount: impl Into<String>,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            category: category.into(),
            description: None,
            date: date.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(self) -> Result<ValidExpense, AppError> {
        let amount: Amount = self
            .amount
            .parse()
            .map_err(|e| AppError::Validation(format!("invalid amount '{}': {}", self.amount, e)))?;
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            AppError::Validation(format!("invalid date '{}': expected YYYY-MM-DD", self.date))
        })?;

        Ok(ValidExpense {
            amount,
            category: self.category,
            description: self.description,
            date,
        })
    }
}

fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AmountInput {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match AmountInput::deserialize(deserializer)? {
        AmountInput::Text(text) => text,
        AmountInput::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registered {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseAdded {
    pub expense_id: ExpenseId,
}

/// One row of an expense listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseView {
    pub expense_id: ExpenseId,
    pub amount: Amount,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl From<&Expense> for ExpenseView {
    fn from(expense: &Expense) -> Self {
        Self {
            expense_id: expense.id,
            amount: expense.amount,
            category: expense.category.clone(),
            description: expense.description.clone(),
            date: expense.date,
        }
    }
}
