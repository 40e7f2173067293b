use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type AccountId = Uuid;

/// Longest username accepted at registration, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Stored output of the password KDF.
///
/// `hash` is a PHC string (it embeds the algorithm, cost parameters and salt);
/// `salt` is kept alongside it so the pair can be inspected without parsing.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("hash", &"<redacted>")
            .field("salt", &self.salt)
            .finish()
    }
}

/// A registered user. Accounts are created once and never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Unique and case-sensitive.
    pub username: String,
    pub password: PasswordDigest,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, password: PasswordDigest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password,
            created_at,
        }
    }
}

/// Check a username before registration. Returns the reason on failure.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.trim().is_empty() {
        return Err("username must not be empty");
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err("username is too long");
    }
    if username.chars().any(char::is_control) {
        return Err("username must not contain control characters");
    }
    Ok(())
}
