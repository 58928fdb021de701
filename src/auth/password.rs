use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::HashingConfig;

/// Argon2id hasher configured once at startup.
#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
    // Verified against when a login names an unknown email.
    dummy_hash: String,
}

impl Passwords {
    pub fn new(cfg: &HashingConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut passwords = Self {
            argon2,
            dummy_hash: String::new(),
        };
        passwords.dummy_hash = passwords.hash("gymdesk-placeholder-secret")?;
        Ok(passwords)
    }

    /// Salted one-way digest in PHC string format.
    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Returns `false` for a mismatch and for a digest that does not parse.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Verifies against the placeholder digest; always `false`.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
pub(crate) fn fast_config() -> HashingConfig {
    HashingConfig {
        memory_kib: Params::MIN_M_COST,
        iterations: 1,
        parallelism: 1,
    }
}
