// ufo_storefront/src/services/token_service.rs

//! Per-order security tokens. The plain token is handed to the customer once;
//! only its Argon2 hash is stored.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use rand_core::RngCore;
use tracing::{debug, error, instrument};

const TOKEN_BYTES: usize = 32;

/// 32 random bytes, hex encoded.
pub fn generate_security_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

#[instrument(name = "token_service::hash", skip(token), err(Display))]
pub fn hash_security_token(token: &str) -> Result<String, AppError> {
  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(token.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Security token hashed.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 token hashing failed.");
      Err(AppError::Internal(format!("Security token hashing failed: {}", argon_err)))
    }
  }
}

/// `Ok(false)` for a wrong token; `Err` only when the stored hash is unreadable.
#[instrument(name = "token_service::verify", skip(stored_hash, presented), err(Display))]
pub fn verify_security_token(stored_hash: &str, presented: &str) -> Result<bool, AppError> {
  if presented.is_empty() {
    return Ok(false);
  }
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Stored security token hash is malformed.");
    AppError::Internal(format!("Malformed security token hash: {}", e))
  })?;
  match Argon2::default().verify_password(presented.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(e) => {
      error!(error = %e, "Argon2 token verification failed.");
      Err(AppError::Internal(format!("Security token verification failed: {}", e)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_is_64_hex_chars_and_unique() {
    let a = generate_security_token();
    let b = generate_security_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(hex::decode(&a).unwrap().len(), TOKEN_BYTES);
    assert_ne!(a, b);
  }

  #[test]
  fn hash_verifies_only_the_original_token() {
    let token = generate_security_token();
    let hash = hash_security_token(&token).unwrap();
    assert_ne!(hash, token);
    assert!(verify_security_token(&hash, &token).unwrap());
    assert!(!verify_security_token(&hash, "0000").unwrap());
    assert!(!verify_security_token(&hash, "").unwrap());
  }

  #[test]
  fn malformed_hash_is_an_error() {
    assert!(verify_security_token("not-a-phc-string", "abc").is_err());
  }
}
