use crate::error::AppError;

// Work factor matches the deployed policy; raising it invalidates no stored
// hashes because the cost is embedded in each hash string.
const BCRYPT_COST: u32 = 10;

/// Derives a salted bcrypt hash of `password`.
pub fn hash(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AppError::Internal(e.to_string()))
}

/// Checks `password` against a stored hash through bcrypt's own comparison,
/// never via string equality on the hash.
pub fn verify(password: &str, hashed: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hashed).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash("secret1").unwrap();
        assert_ne!(hashed, "secret1");
        assert!(verify("secret1", &hashed).unwrap());
        assert!(!verify("wrong1", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash("secret1").unwrap();
        let b = hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify("secret1", "not-a-bcrypt-hash").is_err());
    }
}
