//! Argon2id password storage in PHC string format.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use blogicum_core::ports::{AuthError, PasswordService};

#[derive(Default)]
pub struct Argon2PasswordService {
    hasher: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn make_password(&self, raw: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let encoded = self
            .hasher
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        Ok(encoded.to_string())
    }

    fn check_password(&self, raw: &str, encoded: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(encoded).map_err(|e| AuthError::Encoding(e.to_string()))?;

        match self.hasher.verify_password(raw.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Encoding(e.to_string())),
        }
    }
}
