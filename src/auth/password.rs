// Password hashing with Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::auth::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 100;

pub struct PasswordService;

impl PasswordService {
    /// Hash a password into a PHC string
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    }

    /// Verify a password against a stored PHC string.
    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = PasswordService::hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordService::verify_password("correct horse", &hash));
        assert!(!PasswordService::verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = PasswordService::hash_password("same").unwrap();
        let b = PasswordService::hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!PasswordService::verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_strength_bounds() {
        assert!(PasswordService::validate_password_strength("12345").is_err());
        assert!(PasswordService::validate_password_strength("123456").is_ok());
        assert!(PasswordService::validate_password_strength(&"x".repeat(101)).is_err());
    }
}
