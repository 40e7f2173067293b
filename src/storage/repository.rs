use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Account, AccountId, Amount, Expense, ExpenseId, PasswordDigest, Session};

use super::{CredentialStore, ExpenseStore, MIGRATION_001_INITIAL, SessionStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store for accounts, sessions and expenses.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            username: row.get("username"),
            password: PasswordDigest {
                hash: row.get("password_hash"),
                salt: row.get("password_salt"),
            },
            created_at: decode_timestamp(&created_at_str).context("Invalid created_at")?,
        })
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
        let account_id_str: String = row.get("account_id");
        let issued_at_str: String = row.get("issued_at");
        let expires_at_str: String = row.get("expires_at");

        Ok(Session {
            token_digest: row.get("token_digest"),
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            issued_at: decode_timestamp(&issued_at_str).context("Invalid issued_at")?,
            expires_at: decode_timestamp(&expires_at_str).context("Invalid expires_at")?,
        })
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let date_str: String = row.get("expense_date");
        let created_at_str: String = row.get("created_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            sequence: row.get("sequence"),
            owner_id: Uuid::parse_str(&owner_str).context("Invalid owner ID")?,
            amount: Amount::from_cents(row.get("amount_cents")).context("Invalid amount")?,
            category: row.get("category"),
            description: row.get("description"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .context("Invalid expense date")?,
            created_at: decode_timestamp(&created_at_str).context("Invalid created_at")?,
        })
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[async_trait]
impl CredentialStore for Repository {
    async fn insert_account(&self, account: &Account) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, password_salt, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.password.hash)
        .bind(&account.password.salt)
        .bind(encode_timestamp(&account.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(false),
            Err(err) => Err(anyhow::Error::new(err).context("Failed to save account")),
        }
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, password_salt, created_at
            FROM accounts
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by username")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, password_salt, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }
}

#[async_trait]
impl SessionStore for Repository {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_digest, account_id, issued_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.token_digest)
        .bind(session.account_id.to_string())
        .bind(encode_timestamp(&session.issued_at))
        .bind(encode_timestamp(&session.expires_at))
        .execute(&self.pool)
        .await
        .context("Failed to save session")?;
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT token_digest, account_id, issued_at, expires_at
            FROM sessions
            WHERE token_digest = ?
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch session")?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(encode_timestamp(&now))
            .execute(&self.pool)
            .await
            .context("Failed to purge expired sessions")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ExpenseStore for Repository {
    async fn insert_expense(&self, expense: &mut Expense) -> Result<()> {
        // The sequence is the AUTOINCREMENT key, so assignment and insert are one statement.
        let row = sqlx::query(
            r#"
            INSERT INTO expenses (id, owner_id, amount_cents, category, description, expense_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING sequence
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.owner_id.to_string())
        .bind(expense.amount.cents())
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(encode_timestamp(&expense.created_at))
        .fetch_one(&self.pool)
        .await
        .context("Failed to save expense")?;

        expense.sequence = row.get("sequence");
        Ok(())
    }

    async fn list_expenses(&self, owner: AccountId) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, id, owner_id, amount_cents, category, description, expense_date, created_at
            FROM expenses
            WHERE owner_id = ?
            ORDER BY expense_date DESC, created_at DESC, sequence DESC
            "#,
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    async fn delete_expense(&self, owner: AccountId, id: ExpenseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete expense")?;
        Ok(result.rows_affected() > 0)
    }
}
