//! PIN digest and caller-side PIN rules.

use crate::model::ValidationError;
use sha2::{Digest, Sha256};

/// Minimum PIN length accepted by [`validate_new_pin`].
pub const MIN_PIN_LEN: usize = 4;

/// Returns the lowercase hex SHA-256 digest of `pin`.
pub fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compares two digests without short-circuiting on the first mismatch.
pub fn digests_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Checks a new PIN before it reaches the lock gate: at least
/// [`MIN_PIN_LEN`] characters and identical to its confirmation.
pub fn validate_new_pin(pin: &str, confirm: &str) -> Result<(), ValidationError> {
    if pin.chars().count() < MIN_PIN_LEN {
        return Err(ValidationError::Pin("PIN must be at least 4 digits"));
    }
    if pin != confirm {
        return Err(ValidationError::Pin("PINs do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{digests_match, hash_pin, validate_new_pin};

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_pin("1234"),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
    }

    #[test]
    fn digests_match_requires_equal_content() {
        let digest = hash_pin("1234");
        assert!(digests_match(&digest, &hash_pin("1234")));
        assert!(!digests_match(&digest, &hash_pin("4321")));
        assert!(!digests_match(&digest, "short"));
    }

    #[test]
    fn new_pin_rules() {
        assert_eq!(
            validate_new_pin("123", "123").unwrap_err().to_string(),
            "PIN must be at least 4 digits"
        );
        assert_eq!(
            validate_new_pin("1234", "1235").unwrap_err().to_string(),
            "PINs do not match"
        );
        assert!(validate_new_pin("1234", "1234").is_ok());
    }
}
