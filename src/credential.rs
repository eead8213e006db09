//! Salted PBKDF2 credential derivation, compatible with previously stored rows.
use anyhow::{anyhow, Result};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, TryRngCore};
use sha2::Sha512;
use std::env;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;

// Stored rows were derived with 1000 rounds; deployments raise this through
// PASSWORD_ROUNDS once no legacy rows remain.
pub const DEFAULT_ROUNDS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct Credential {
    pub hash: String,
    pub salt: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    rounds: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
        }
    }
}

impl CredentialHasher {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn from_env() -> Self {
        let rounds = env::var("PASSWORD_ROUNDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ROUNDS);
        Self::new(rounds)
    }

    /// Derives a credential with a fresh random salt.
    pub fn derive(&self, password: &str) -> Result<Credential> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| anyhow!("Failed to generate salt: {e}"))?;
        let salt = hex::encode(salt);
        let hash = self.derive_with_salt(password, &salt);
        Ok(Credential { hash, salt })
    }

    // The KDF consumes the hex salt string's bytes, not the decoded bytes;
    // existing rows were written that way and must keep verifying.
    pub fn derive_with_salt(&self, password: &str, salt: &str) -> String {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), self.rounds, &mut key);
        hex::encode(key)
    }

    /// A mismatch is `false`, never an error.
    pub fn verify(&self, password: &str, salt: &str, expected_hash: &str) -> bool {
        let computed = self.derive_with_salt(password, salt);
        constant_time_eq(computed.as_bytes(), expected_hash.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_and_verifies() {
        let hasher = CredentialHasher::default();
        let cred = hasher.derive("abc123").unwrap();
        assert_eq!(cred.salt.len(), 32);
        assert_eq!(cred.hash.len(), 128);
        assert!(hasher.verify("abc123", &cred.salt, &cred.hash));
        assert!(!hasher.verify("abc124", &cred.salt, &cred.hash));
    }

    #[test]
    fn same_salt_same_digest() {
        let hasher = CredentialHasher::default();
        let cred = hasher.derive("abc123").unwrap();
        assert_eq!(cred.hash, hasher.derive_with_salt("abc123", &cred.salt));
    }

    #[test]
    fn fresh_salts_differ() {
        let hasher = CredentialHasher::default();
        let a = hasher.derive("abc123").unwrap();
        let b = hasher.derive("abc123").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn rounds_change_the_digest() {
        let weak = CredentialHasher::default();
        let strong = CredentialHasher::new(2000);
        let cred = weak.derive("abc123").unwrap();
        assert_ne!(strong.derive_with_salt("abc123", &cred.salt), cred.hash);
        assert!(!strong.verify("abc123", &cred.salt, &cred.hash));
    }
}
