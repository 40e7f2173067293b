use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::domain::PasswordDigest;

use super::{AppError, KdfParams};

const SALT_LEN: usize = 16;

/// Argon2id password hashing with a fresh random salt per account.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    params: KdfParams,
}

impl CredentialHasher {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Result<Argon2<'static>, AppError> {
        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            None,
        )
        .map_err(|e| AppError::PasswordHashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn hash(&self, password: &str) -> Result<PasswordDigest, AppError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::PasswordHashing(e.to_string()))?;

        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::PasswordHashing(e.to_string()))?;

        Ok(PasswordDigest {
            hash: hash.to_string(),
            salt: salt.as_str().to_string(),
        })
    }

    /// Check a password against a stored digest. Cost parameters come from
    /// the stored PHC string, not from this hasher's configuration.
    pub fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(&digest.hash)
            .map_err(|e| AppError::PasswordHashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn roughly the cost of one verification. Keeps failed logins for
    /// unknown usernames indistinguishable by timing.
    pub fn spend_equivalent_work(&self, password: &str) {
        if let Err(e) = self.hash(password) {
            warn!(error = %e, "dummy password hash failed; login timing is not equalized");
        }
    }
}
