//! Password hashing seam. The store only ever sees the opaque hash string.

use thiserror::Error;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

pub trait CredentialHasher: Send + Sync + 'static {
    /// Hash a plaintext password into an opaque, self-describing string.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
    /// Check a plaintext password against a hash produced by `hash`.
    fn verify(&self, plaintext: &str, hashed: &str) -> bool;
}

/// bcrypt with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    /// Cheapest cost bcrypt accepts. Only meant for tests.
    pub fn fast() -> Self {
        Self::new(MIN_COST)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        match bcrypt::verify(plaintext, hashed) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }
}
