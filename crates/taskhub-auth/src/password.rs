//! Password hashing and verification.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - An optional pepper is supplied to Argon2 as its secret input
//!
//! # Example
//!
//! ```
//! use taskhub_auth::password::PasswordCodec;
//!
//! let codec = PasswordCodec::with_pepper("pepper");
//! let hash = codec.hash("Passw0rd!").unwrap();
//!
//! assert!(codec.verify("Passw0rd!", &hash).unwrap());
//! assert!(!codec.verify("wrong", &hash).unwrap());
//! ```

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Error returned when hashing fails or a stored digest cannot be parsed.
pub type PasswordError = argon2::password_hash::Error;

/// Argon2id hasher with an optional pepper.
#[derive(Clone, Default)]
pub struct PasswordCodec {
    pepper: Option<Vec<u8>>,
}

impl PasswordCodec {
    /// Codec without a pepper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that feeds `pepper` into every hash. An empty pepper is ignored.
    #[must_use]
    pub fn with_pepper(pepper: impl AsRef<[u8]>) -> Self {
        let pepper = pepper.as_ref();
        Self {
            pepper: (!pepper.is_empty()).then(|| pepper.to_vec()),
        }
    }

    fn argon2(&self) -> Result<Argon2<'_>, PasswordError> {
        match &self.pepper {
            Some(secret) => Argon2::new_with_secret(
                secret,
                Algorithm::Argon2id,
                Version::V0x13,
                Params::default(),
            )
            .map_err(PasswordError::from),
            None => Ok(Argon2::default()),
        }
    }

    /// Hashes a password for storage.
    ///
    /// Returns a PHC-formatted string. Two calls with the same input produce
    /// different digests because each gets a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns an error only if Argon2 itself fails (rare).
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2()?.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored digest.
    ///
    /// `Ok(false)` means the password does not match.
    ///
    /// # Errors
    ///
    /// Returns `Err` only if `hash` is not a valid PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)?;
        let result = self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed_hash);
        Ok(result.is_ok())
    }
}

impl std::fmt::Debug for PasswordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCodec")
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}
