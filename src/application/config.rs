use chrono::Duration;

/// Default lifetime of a session.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

/// Default minimum password length, in characters.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords longer than this are refused to bound hashing work.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Argon2id cost parameters used for new password hashes.
///
/// Existing hashes carry their own parameters in the PHC string, so changing
/// these never breaks verification of older accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub min_password_length: usize,
    pub kdf: KdfParams,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            kdf: KdfParams::default(),
        }
    }
}

impl AuthConfig {
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}
