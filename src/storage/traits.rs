//! Storage ports used by the application layer.
//!
//! Services receive these as `Arc<dyn ...>` so the SQLite repository, the
//! in-memory store and test doubles are interchangeable.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, AccountId, Expense, ExpenseId, Session};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a new account.
    /// Returns `false` without writing anything if the username is taken.
    async fn insert_account(&self, account: &Account) -> Result<bool>;

    /// Look up an account by its exact (case-sensitive) username.
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<()>;

    /// Fetch a session by token digest, expired or not.
    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>>;

    /// Returns `true` if a session was removed.
    async fn delete_session(&self, token_digest: &str) -> Result<bool>;

    /// Remove every session with `expires_at <= now`. Returns how many went.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Store a new expense in a single atomic write and set its sequence number.
    async fn insert_expense(&self, expense: &mut Expense) -> Result<()>;

    /// All expenses of one owner, ordered by [`crate::domain::newest_first`].
    async fn list_expenses(&self, owner: AccountId) -> Result<Vec<Expense>>;

    /// Delete an expense only if it belongs to `owner`.
    /// Returns `true` if a row was removed.
    async fn delete_expense(&self, owner: AccountId, id: ExpenseId) -> Result<bool>;
}
