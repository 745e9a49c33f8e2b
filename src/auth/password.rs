use crate::error::AppError;
use bcrypt::{hash, verify};

/// Work factor used when `BCRYPT_COST` is not set.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Salted, slow one-way password hashing.
///
/// Digests are self-describing (`$2b$<cost>$...`), so verification needs nothing but
/// the stored string.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Returns `false` for a mismatch and for a digest bcrypt cannot parse.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        verify(password, digest).unwrap_or(false)
    }
}
