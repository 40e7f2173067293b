use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, AccountId, Expense, ExpenseId, Session, newest_first};

use super::{CredentialStore, ExpenseStore, SessionStore};

#[derive(Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    by_username: HashMap<String, AccountId>,
}

#[derive(Default)]
struct Expenses {
    by_owner: HashMap<AccountId, Vec<Expense>>,
    last_sequence: i64,
}

/// Non-durable store keeping everything in process memory.
///
/// Each table sits behind its own mutex, held for exactly one operation, so
/// every write is atomic with respect to concurrent readers.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<Accounts>,
    sessions: Mutex<HashMap<String, Session>>,
    expenses: Mutex<Expenses>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, table: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow!("{} table lock poisoned", table))
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<bool> {
        let mut accounts = lock(&self.accounts, "accounts")?;
        if accounts.by_username.contains_key(&account.username) {
            return Ok(false);
        }
        accounts
            .by_username
            .insert(account.username.clone(), account.id);
        accounts.by_id.insert(account.id, account.clone());
        Ok(true)
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let accounts = lock(&self.accounts, "accounts")?;
        Ok(accounts
            .by_username
            .get(username)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = lock(&self.accounts, "accounts")?;
        Ok(accounts.by_id.get(&id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        sessions.insert(session.token_digest.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>> {
        let sessions = lock(&self.sessions, "sessions")?;
        Ok(sessions.get(token_digest).cloned())
    }

    async fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        Ok(sessions.remove(token_digest).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert_expense(&self, expense: &mut Expense) -> Result<()> {
        let mut expenses = lock(&self.expenses, "expenses")?;
        expenses.last_sequence += 1;
        expense.sequence = expenses.last_sequence;
        expenses
            .by_owner
            .entry(expense.owner_id)
            .or_default()
            .push(expense.clone());
        Ok(())
    }

    async fn list_expenses(&self, owner: AccountId) -> Result<Vec<Expense>> {
        let expenses = lock(&self.expenses, "expenses")?;
        let mut owned = expenses.by_owner.get(&owner).cloned().unwrap_or_default();
        owned.sort_by(newest_first);
        Ok(owned)
    }

    async fn delete_expense(&self, owner: AccountId, id: ExpenseId) -> Result<bool> {
        let mut expenses = lock(&self.expenses, "expenses")?;
        let Some(owned) = expenses.by_owner.get_mut(&owner) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|expense| expense.id != id);
        Ok(owned.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Amount, PasswordDigest};

    fn account(username: &str) -> Account {
        Account::new(
            username.to_string(),
            PasswordDigest {
                hash: "hash".into(),
                salt: "salt".into(),
            },
            Utc::now(),
        )
    }

    fn expense(owner: AccountId, date: &str) -> Expense {
        Expense::new(
            owner,
            Amount::from_cents(100).unwrap(),
            "food",
            date.parse::<NaiveDate>().unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_username_is_not_inserted() {
        let store = MemoryStore::new();
        let first = account("alice");
        assert!(store.insert_account(&first).await.unwrap());
        assert!(!store.insert_account(&account("alice")).await.unwrap());
        assert!(store.insert_account(&account("Alice")).await.unwrap());

        let found = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let store = MemoryStore::new();
        let owner = AccountId::new_v4();
        let mut a = expense(owner, "2024-01-01");
        let mut b = expense(owner, "2024-01-01");
        store.insert_expense(&mut a).await.unwrap();
        store.insert_expense(&mut b).await.unwrap();
        assert!(b.sequence > a.sequence);

        let listed = store.list_expenses(owner).await.unwrap();
        assert_eq!(listed[0].id, b.id);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = AccountId::new_v4();
        let stranger = AccountId::new_v4();
        let mut e = expense(owner, "2024-01-01");
        store.insert_expense(&mut e).await.unwrap();

        assert!(!store.delete_expense(stranger, e.id).await.unwrap());
        assert!(store.delete_expense(owner, e.id).await.unwrap());
        assert!(!store.delete_expense(owner, e.id).await.unwrap());
    }
}
