use std::ops::RangeInclusive;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use anyhow::Context;
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Raw lengths that get hashed on write. Anything outside this window is
/// stored as given, which means it can never pass [`verify_password`].
pub const HASHED_LENGTHS: RangeInclusive<usize> = 8..=20;

/// Argon2id hasher with a fixed work factor.
#[derive(Clone)]
pub struct PasswordPolicy {
    params: Params,
}

impl PasswordPolicy {
    pub fn new(cfg: PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.work_factor, 1, None).map_err(|e| {
            error!(error = %e, "argon2 params error");
            anyhow::anyhow!("invalid password hashing parameters: {e}")
        })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Value to persist for a raw password written by a client. Hashing runs
    /// on the blocking pool.
    pub async fn prepare(&self, raw: String) -> anyhow::Result<String> {
        if !HASHED_LENGTHS.contains(&raw.chars().count()) {
            return Ok(raw);
        }
        let policy = self.clone();
        tokio::task::spawn_blocking(move || policy.hash(&raw))
            .await
            .context("spawn password hashing task")?
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The stored value is not a PHC hash string.
    #[error("stored password is not a hash: {0}")]
    Unparseable(String),
    #[error("password verification task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Checks `plain` against a PHC hash string, using the salt and cost embedded
/// in it. Runs on the blocking pool.
pub async fn verify_password(plain: String, hash: String) -> Result<bool, VerifyError> {
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &hash)).await?
}

fn verify_blocking(plain: &str, hash: &str) -> Result<bool, VerifyError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        VerifyError::Unparseable(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
pub(crate) fn test_policy() -> PasswordPolicy {
    PasswordPolicy::new(PasswordConfig {
        work_factor: 10,
        memory_kib: 64,
    })
    .expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn verify(plain: &str, hash: &str) -> Result<bool, VerifyError> {
        verify_password(plain.to_string(), hash.to_string()).await
    }

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let policy = test_policy();
        for password in ["12345678", "Secur3P@ssw0rd!", "twenty-chars-exactly"] {
            let hash = policy.hash(password).expect("hashing should succeed");
            assert!(verify(password, &hash).await.expect("verify should succeed"));
        }
    }

    #[tokio::test]
    async fn same_password_gets_a_fresh_salt() {
        let policy = test_policy();
        let a = policy.hash("correct-horse").unwrap();
        let b = policy.hash("correct-horse").unwrap();
        assert_ne!(a, b);
        assert!(verify("correct-horse", &a).await.unwrap());
        assert!(verify("correct-horse", &b).await.unwrap());
    }

    #[test]
    fn hash_carries_the_work_factor() {
        let hash = test_policy().hash("password1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("t=10"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hash = test_policy().hash("correct-horse").unwrap();
        assert!(!verify("wrong-password", &hash).await.expect("verify should not error"));
    }

    #[tokio::test]
    async fn verify_errors_on_malformed_hash() {
        let err = verify("anything", "not-a-valid-hash").await.unwrap_err();
        assert!(matches!(err, VerifyError::Unparseable(_)));
    }

    #[tokio::test]
    async fn prepare_hashes_inside_the_window() {
        let policy = test_policy();
        for raw in ["a".repeat(8), "b".repeat(14), "c".repeat(20)] {
            let stored = policy.prepare(raw.clone()).await.unwrap();
            assert_ne!(stored, raw);
            assert!(verify(&raw, &stored).await.unwrap());
        }
    }

    #[tokio::test]
    async fn prepare_keeps_out_of_range_values_as_is() {
        let policy = test_policy();
        for raw in ["a".to_string(), "b".repeat(7), "c".repeat(21), "d".repeat(64)] {
            assert_eq!(policy.prepare(raw.clone()).await.unwrap(), raw);
        }
    }

    #[tokio::test]
    async fn window_counts_characters_not_bytes() {
        // 8 characters, 16 bytes
        let raw = "ééééééé1".to_string();
        let stored = test_policy().prepare(raw.clone()).await.unwrap();
        assert!(verify(&raw, &stored).await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_free() {
        let policy = PasswordPolicy::new(PasswordConfig::default()).unwrap();
        let hashing = tokio::spawn(async move { policy.prepare("joepassword".into()).await });
        // an inline hash would complete on its first poll, before `ticked` runs
        let ticked = tokio::spawn(async { tokio::task::yield_now().await });
        ticked.await.unwrap();
        assert!(!hashing.is_finished());
        let stored = hashing.await.unwrap().unwrap();
        assert!(verify("joepassword", &stored).await.unwrap());
    }
}
