//! Password Hashing
//! Salted, adaptive-cost one-way digests (bcrypt).

use anyhow::{bail, Context, Result};
use tracing::debug;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way password digest with verification.
///
/// `verify` never errors: a wrong password and a corrupted digest are both
/// just `false`, so callers cannot tell the two apart.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    fn verify(&self, digest: &str, plaintext: &str) -> bool;

    /// A valid digest of an unguessable value, verified against when the
    /// looked-up principal does not exist so both login paths cost the same.
    fn decoy_digest(&self) -> &str;
}

pub struct BcryptHasher {
    cost: u32,
    decoy: String,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Result<Self> {
        let decoy = bcrypt::hash("bytebros-decoy-credential", cost)
            .context("Failed to prepare decoy digest")?;
        Ok(Self { cost, decoy })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            bail!("refusing to hash an empty password");
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            bail!(
                "refusing to hash a password longer than {} bytes",
                MAX_PASSWORD_BYTES
            );
        }
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    fn verify(&self, digest: &str, plaintext: &str) -> bool {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            let _ = bcrypt::verify(plaintext, &self.decoy);
            return false;
        }
        match bcrypt::verify(plaintext, digest) {
            Ok(valid) => valid,
            Err(e) => {
                debug!("Unverifiable password digest: {}", e);
                // Same work as a real comparison.
                let _ = bcrypt::verify(plaintext, &self.decoy);
                false
            }
        }
    }

    fn decoy_digest(&self) -> &str {
        &self.decoy
    }
}
