//! Admin password hashing and the password policy.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::DermisError;

pub const WEAK_PASSWORD_NOTICE: &str = "Password should be at least 8 characters in length and should include at least one upper case letter, one number.";
pub const CONFIRM_MISMATCH_NOTICE: &str = "Confirm password is not matched!";

/// Argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, DermisError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DermisError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// A malformed stored hash counts as a mismatch, not an error.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// At least 8 characters with an upper-case letter, a lower-case letter and a digit,
/// and a matching confirmation.
pub fn check_new_password(password: &str, confirm: &str) -> Result<(), DermisError> {
    let strong = password.chars().count() >= 8
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if !strong {
        return Err(DermisError::bad_request(WEAK_PASSWORD_NOTICE));
    }
    if password != confirm {
        return Err(DermisError::bad_request(CONFIRM_MISMATCH_NOTICE));
    }
    Ok(())
}
