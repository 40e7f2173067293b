// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use spendbook::application::{
    AuthConfig, Credentials, IssuedSession, KdfParams, LedgerService, ManualClock, NewExpense,
};
use spendbook::domain::{AccountId, ExpenseId, SessionToken};
use tempfile::TempDir;

/// Password used by every fixture account
pub const PASSWORD: &str = "correct-horse-battery";

/// Auth settings with the KDF turned down so tests stay fast
pub fn test_config() -> AuthConfig {
    AuthConfig::default().with_kdf(KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let (service, _clock, temp_dir) = test_service_with_clock().await?;
    Ok((service, temp_dir))
}

/// Same as [`test_service`] but with a clock the test controls
pub async fn test_service_with_clock() -> Result<(LedgerService, Arc<ManualClock>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service =
        LedgerService::init_with_clock(db_path.to_str().unwrap(), test_config(), clock.clone())
            .await?;
    Ok((service, clock, temp_dir))
}

/// Test fixture: a registered account with an open session
pub struct User {
    pub id: AccountId,
    pub token: SessionToken,
}

impl User {
    pub async fn create(service: &LedgerService, username: &str) -> Result<Self> {
        let credentials = Credentials::new(username, PASSWORD);
        let id = service.register(&credentials).await?;
        let IssuedSession { token, .. } = service.login(&credentials).await?;
        Ok(Self { id, token })
    }

    pub async fn spend(
        &self,
        service: &LedgerService,
        amount: &str,
        category: &str,
        date: &str,
    ) -> Result<ExpenseId> {
        Ok(service
            .add_expense(&self.token, NewExpense::new(amount, category, date))
            .await?)
    }
}
