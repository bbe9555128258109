use crate::error::{AppError, AppResult};

/// bcrypt work factor. Each increment doubles the hashing time.
pub const HASH_COST: u32 = 10;

/// Hash a password with a fresh random salt.
pub fn hash(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, HASH_COST)
}

/// Check a password attempt. A malformed digest is a failed match.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

/// `hash` on the blocking pool, for use from request handlers.
pub async fn hash_blocking(plaintext: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(&plaintext))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// `verify` on the blocking pool, for use from request handlers.
pub async fn verify_blocking(plaintext: String, digest: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(&plaintext, &digest))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))
}
