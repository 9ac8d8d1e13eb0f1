//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};

const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-users";

/// Password hasher with configurable parameters
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Hashed once at construction and verified against when the user does
    // not exist, so both login failure paths cost exactly one Argon2 run
    dummy_hash: String,
    argon2_runs: AtomicU64,
}

impl PasswordHasher {
    /// Create hasher with explicit Argon2id cost parameters
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Config(format!("Invalid Argon2 params: {}", e)))?;

        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: String::new(),
            argon2_runs: AtomicU64::new(0),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(hasher)
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    /// Number of Argon2 computations (hash or verify) performed so far,
    /// including the one made at construction
    pub fn argon2_runs(&self) -> u64 {
        self.argon2_runs.load(Ordering::Relaxed)
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        self.argon2_runs.fetch_add(1, Ordering::Relaxed);
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::Internal(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored PHC hash
    ///
    /// Mismatch yields `InvalidCredentials`; an unparseable stored hash is a
    /// server-side fault.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Failed to parse password hash: {:?}", e);
            AppError::Internal(format!("Failed to parse password hash: {}", e))
        })?;

        self.argon2_runs.fetch_add(1, Ordering::Relaxed);
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)
    }

    /// Run a verification that always fails, for logins with an unknown
    /// username; returns the error the caller should report
    pub fn verify_dummy(&self, password: &str) -> AppError {
        // Result ignored: an unknown user never logs in
        let _ = self.verify(password, &self.dummy_hash);
        AppError::InvalidCredentials
    }
}
