use std::sync::Arc;

use tracing::debug;

use crate::domain::{AccountId, Expense, ExpenseId, SessionToken, Summary};
use crate::storage::{CredentialStore, ExpenseStore, MemoryStore, Repository, SessionStore};

use super::clock::{SharedClock, system_clock};
use super::{
    AggregationEngine, AppError, AuthConfig, AuthService, Credentials, IssuedSession, LedgerStore,
    NewExpense,
};

/// Application service providing the operations a transport calls.
/// Every expense operation resolves the session first and fails with
/// [`AppError::InvalidSession`] before any ledger access.
pub struct LedgerService {
    auth: AuthService,
    ledger: LedgerStore,
    aggregation: AggregationEngine,
}

impl LedgerService {
    pub fn new(auth: AuthService, ledger: LedgerStore) -> Self {
        let aggregation = AggregationEngine::new(ledger.clone());
        Self {
            auth,
            ledger,
            aggregation,
        }
    }

    /// Wire the services over explicit storage ports.
    pub fn with_stores(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        expenses: Arc<dyn ExpenseStore>,
        clock: SharedClock,
        config: AuthConfig,
    ) -> Self {
        let auth = AuthService::new(credentials, sessions, clock.clone(), config);
        let ledger = LedgerStore::new(expenses, clock);
        Self::new(auth, ledger)
    }

    /// Use one repository for every port.
    pub fn from_repository(repo: Repository, clock: SharedClock, config: AuthConfig) -> Self {
        let repo = Arc::new(repo);
        Self::with_stores(repo.clone(), repo.clone(), repo, clock, config)
    }

    /// Non-durable service, everything kept in memory.
    pub fn in_memory(clock: SharedClock, config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(store.clone(), store.clone(), store, clock, config)
    }

    /// Create (if needed) and migrate the database at the given path.
    pub async fn init(database_path: &str, config: AuthConfig) -> Result<Self, AppError> {
        Self::init_with_clock(database_path, config, system_clock()).await
    }

    pub async fn init_with_clock(
        database_path: &str,
        config: AuthConfig,
        clock: SharedClock,
    ) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::from_repository(repo, clock, config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: AuthConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::from_repository(repo, system_clock(), config))
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// The clock every timestamp of this service is taken from.
    pub fn clock(&self) -> &SharedClock {
        self.auth.clock()
    }

    // ========================
    // Account operations
    // ========================

    pub async fn register(&self, credentials: &Credentials) -> Result<AccountId, AppError> {
        self.auth
            .register(&credentials.username, &credentials.password)
            .await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<IssuedSession, AppError> {
        self.auth
            .login(&credentials.username, &credentials.password)
            .await
    }

    pub async fn logout(&self, token: &SessionToken) -> Result<(), AppError> {
        self.auth.logout(token).await
    }

    /// Maintenance: drop session rows that can no longer validate.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        self.auth.purge_expired_sessions().await
    }

    // ========================
    // Expense operations
    // ========================

    pub async fn add_expense(
        &self,
        token: &SessionToken,
        expense: NewExpense,
    ) -> Result<ExpenseId, AppError> {
        let owner = self.auth.verify(token).await?;
        let expense = expense.validate()?;
        self.ledger
            .add(
                owner,
                expense.amount,
                &expense.category,
                expense.description.as_deref(),
                expense.date,
            )
            .await
    }

    pub async fn list_expenses(&self, token: &SessionToken) -> Result<Vec<Expense>, AppError> {
        let owner = self.auth.verify(token).await?;
        let expenses = self.ledger.list(owner).await?;
        debug!(owner = %owner, count = expenses.len(), "expenses listed");
        Ok(expenses)
    }

    pub async fn delete_expense(
        &self,
        token: &SessionToken,
        expense_id: ExpenseId,
    ) -> Result<(), AppError> {
        let owner = self.auth.verify(token).await?;
        self.ledger.delete(owner, expense_id).await
    }

    pub async fn summary(&self, token: &SessionToken) -> Result<Summary, AppError> {
        let owner = self.auth.verify(token).await?;
        self.aggregation.summarize(owner).await
    }
}
