use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{Account, AccountId, Session, SessionToken, validate_username};
use crate::storage::{CredentialStore, SessionStore};

use super::clock::{SharedClock, now_micros};
use super::{AppError, AuthConfig, CredentialHasher, MAX_PASSWORD_LENGTH};

/// What a client receives after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    #[serde(rename = "session_token")]
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
}

/// Account registration, login and session verification.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    clock: SharedClock,
    hasher: CredentialHasher,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        clock: SharedClock,
        config: AuthConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            clock,
            hasher: CredentialHasher::new(config.kdf),
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Create an account. Exactly one account exists per username afterwards.
    pub async fn register(&self, username: &str, password: &str) -> Result<AccountId, AppError> {
        validate_username(username).map_err(AppError::validation)?;

        let length = password.chars().count();
        if length < self.config.min_password_length {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(AppError::validation("password is too long"));
        }

        let digest = self.hasher.hash(password)?;
        let account = Account::new(username.to_string(), digest, now_micros(&self.clock));

        if !self.credentials.insert_account(&account).await? {
            debug!("registration rejected: username taken");
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        info!(account_id = %account.id, "account registered");
        Ok(account.id)
    }

    /// Check a username/password pair and open a new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AppError> {
        let Some(account) = self.credentials.find_account_by_username(username).await? else {
            self.hasher.spend_equivalent_work(password);
            warn!("login failed");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password)? {
            warn!("login failed");
            return Err(AppError::InvalidCredentials);
        }

        let token = SessionToken::generate();
        let session = Session::new(
            &token,
            account.id,
            now_micros(&self.clock),
            self.config.session_ttl,
        );
        self.sessions.insert_session(&session).await?;

        info!(account_id = %account.id, expires_at = %session.expires_at, "session opened");
        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
        })
    }

    /// Resolve a token to its account. Expiry is checked here, lazily;
    /// stale rows left in storage never validate.
    pub async fn verify(&self, token: &SessionToken) -> Result<AccountId, AppError> {
        let session = self
            .sessions
            .find_session(&token.digest())
            .await?
            .ok_or(AppError::InvalidSession)?;

        if session.is_expired_at(self.clock.utc()) {
            debug!(account_id = %session.account_id, "expired session presented");
            return Err(AppError::InvalidSession);
        }

        Ok(session.account_id)
    }

    /// End a session. Unknown or already expired tokens are not an error.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), AppError> {
        if self.sessions.delete_session(&token.digest()).await? {
            debug!("session closed");
        }
        Ok(())
    }

    /// Delete sessions whose expiry has passed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let removed = self
            .sessions
            .delete_expired_sessions(self.clock.utc())
            .await?;
        info!(removed, "expired sessions purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::application::{KdfParams, ManualClock};
    use crate::storage::MemoryStore;

    fn service(clock: Arc<ManualClock>) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = AuthConfig::default().with_kdf(KdfParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        });
        let auth = AuthService::new(store.clone(), store.clone(), clock, config);
        (auth, store)
    }

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let (auth, _) = service(fixed_clock());

        assert!(matches!(
            auth.register("", "longenough").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.register("alice", "short").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (auth, store) = service(fixed_clock());
        let id = auth.register("alice", "s3cret-pass").await.unwrap();

        let account = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.username, "alice");
        assert!(!account.password.hash.contains("s3cret-pass"));
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first_account() {
        let (auth, store) = service(fixed_clock());
        let first = auth.register("alice", "password-one").await.unwrap();

        let second = auth.register("alice", "password-two").await;
        assert!(matches!(second, Err(AppError::DuplicateUsername(_))));

        let account = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.id, first);
        assert!(auth.login("alice", "password-one").await.is_ok());
        assert!(matches!(
            auth.login("alice", "password-two").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, _) = service(fixed_clock());
        auth.register("alice", "password-one").await.unwrap();

        let unknown = auth.login("bob", "password-one").await.unwrap_err();
        let wrong = auth.login("alice", "password-two").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let clock = fixed_clock();
        let (auth, _) = service(clock.clone());
        let id = auth.register("alice", "password-one").await.unwrap();
        let issued = auth.login("alice", "password-one").await.unwrap();

        clock.advance(TimeDelta::minutes(59));
        assert_eq!(auth.verify(&issued.token).await.unwrap(), id);

        clock.advance(TimeDelta::minutes(1));
        assert!(matches!(
            auth.verify(&issued.token).await,
            Err(AppError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (auth, _) = service(fixed_clock());
        auth.register("alice", "password-one").await.unwrap();
        let issued = auth.login("alice", "password-one").await.unwrap();

        auth.logout(&issued.token).await.unwrap();
        auth.logout(&issued.token).await.unwrap();
        auth.logout(&SessionToken::from("never-issued")).await.unwrap();
        assert!(matches!(
            auth.verify(&issued.token).await,
            Err(AppError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_sessions() {
        let clock = fixed_clock();
        let (auth, _) = service(clock.clone());
        auth.register("alice", "password-one").await.unwrap();

        let old = auth.login("alice", "password-one").await.unwrap();
        clock.advance(TimeDelta::minutes(45));
        let fresh = auth.login("alice", "password-one").await.unwrap();
        clock.advance(TimeDelta::minutes(20));

        assert_eq!(auth.purge_expired_sessions().await.unwrap(), 1);
        assert!(auth.verify(&old.token).await.is_err());
        assert!(auth.verify(&fresh.token).await.is_ok());
    }
}
