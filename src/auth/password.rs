//! Password hashing (Argon2id) and strength rules

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::{sync::Arc, time::Duration};

/// Characters accepted as the "special character" rule
pub const PASSWORD_SYMBOLS: &str = ".!@#$%^&*()_+=-";

pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Check a candidate password against the strength rules.
///
/// Rules are evaluated in order (length, uppercase, lowercase, digit, symbol)
/// and the first one that fails is reported.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(AppError::WeakPassword(format!(
            "Password must be at least {} characters long.",
            PASSWORD_MIN_LENGTH
        )));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one uppercase letter.".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one lowercase letter.".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one digit.".to_string(),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one special character.".to_string(),
        ));
    }

    Ok(())
}

/// Password hasher with configurable cost parameters
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    timeout: Duration,
    /// Hash verified against when no account matches, so lookups cost the same
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::with_params(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            config.password_hash_parallelism,
            Duration::from_secs(config.password_hash_timeout_secs),
        )
    }

    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Config(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"dummy-password-for-timing", &salt)
            .map_err(|e| AppError::Config(format!("Argon2 self-test failed: {}", e)))?
            .to_string();

        Ok(Self {
            argon2,
            timeout,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
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
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::debug!("Failed to parse password hash: {:?}", e);
            AppError::Internal(format!("Failed to parse password hash: {}", e))
        })?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)
    }

    /// `hash` on the blocking pool, bounded by the configured timeout
    pub async fn hash_async(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        self.run_blocking("password hashing", move || hasher.hash(&password))
            .await
    }

    /// `verify` on the blocking pool, bounded by the configured timeout
    pub async fn verify_async(&self, password: String, hash: String) -> Result<(), AppError> {
        let hasher = self.clone();
        self.run_blocking("password verification", move || {
            hasher.verify(&password, &hash)
        })
        .await
    }

    /// Spend one verification on a throwaway hash; always `InvalidCredentials`
    pub async fn verify_dummy(&self, password: String) -> AppError {
        let hash = self.dummy_hash.to_string();
        match self.verify_async(password, hash).await {
            Err(e @ AppError::Timeout(_)) => e,
            _ => AppError::InvalidCredentials,
        }
    }

    async fn run_blocking<T, F>(&self, what: &'static str, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AppError::Internal(format!("{} task failed: {}", what, join_err))),
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "{} timed out", what);
                Err(AppError::Timeout(what))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "TestPassword123!";

        let hash = hasher.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        hasher.verify(password, &hash).unwrap();
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("TestPassword123!").unwrap();

        assert!(matches!(
            hasher.verify("WrongPassword", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = fast_hasher();
        let password = "TestPassword123!";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        assert_ne!(hash1, hash2);
        hasher.verify(password, &hash1).unwrap();
        hasher.verify(password, &hash2).unwrap();
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash_async("Str0ng!Pwd".to_string()).await.unwrap();
        hasher
            .verify_async("Str0ng!Pwd".to_string(), hash.clone())
            .await
            .unwrap();
        assert!(hasher.verify_async("nope".to_string(), hash).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_dummy_always_rejects() {
        let hasher = fast_hasher();
        for password in ["anything", "dummy-password-for-timing"] {
            let err = hasher.verify_dummy(password.to_string()).await;
            assert!(matches!(err, AppError::InvalidCredentials));
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHasher::with_params(4, 1, 1, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_strength_accepts_strong_password() {
        assert!(validate_password_strength("Str0ng!Pwd").is_ok());
        assert!(validate_password_strength("aB3-efgh").is_ok());
    }

    #[test]
    fn test_strength_rejects_each_missing_rule() {
        let cases = [
            ("Sh0rt!", "at least 8"),
            ("lowercase1!", "uppercase"),
            ("UPPERCASE1!", "lowercase"),
            ("NoDigits!!", "digit"),
            ("NoSymbol123", "special"),
        ];

        for (candidate, expected) in cases {
            match validate_password_strength(candidate) {
                Err(AppError::WeakPassword(msg)) => {
                    assert!(msg.contains(expected), "{candidate}: {msg}")
                }
                other => panic!("{candidate} should be weak, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_strength_symbol_set_is_fixed() {
        // '?' and '~' are not in the accepted set
        assert!(validate_password_strength("Abcdefg1?").is_err());
        assert!(validate_password_strength("Abcdefg1~").is_err());
        assert!(validate_password_strength("Abcdefg1=").is_ok());
    }
}
