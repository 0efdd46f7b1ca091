use log::info;
use sha2::{Digest, Sha256};

use crate::db::DbPool;

pub struct AdminCredentials;

impl AdminCredentials {
    pub fn hash_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Stores the initial credentials unless some are already present.
    pub async fn seed(pool: &DbPool, username: &str, password: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO admin_credentials (id, username, password_sha256) VALUES (1, ?, ?)",
        )
        .bind(username)
        .bind(Self::hash_password(password))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Seeded admin credentials for user '{}'", username);
        }
        Ok(())
    }

    pub async fn verify(pool: &DbPool, username: &str, password: &str) -> Result<bool, sqlx::Error> {
        let stored = sqlx::query_as::<_, (String, String)>(
            "SELECT username, password_sha256 FROM admin_credentials WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;

        Ok(match stored {
            Some((stored_user, stored_hash)) => {
                let user_matches = constant_time_eq(stored_user.as_bytes(), username.as_bytes());
                let hash_matches = constant_time_eq(
                    stored_hash.as_bytes(),
                    Self::hash_password(password).as_bytes(),
                );
                user_matches & hash_matches
            }
            None => false,
        })
    }

    /// Username is kept, only the password changes
    pub async fn update_password(pool: &DbPool, password: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE admin_credentials SET password_sha256 = ?, updated_at = CURRENT_TIMESTAMP WHERE id = 1",
        )
        .bind(Self::hash_password(password))
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_in_memory_pool;

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            AdminCredentials::hash_password("changeme"),
            "057ba03d6c44104863dc7361fe4578965d1887360f90a0895882e58a6248fc86"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        let hash = AdminCredentials::hash_password("changeme");
        assert!(constant_time_eq(hash.as_bytes(), hash.as_bytes()));
        assert!(!constant_time_eq(
            hash.as_bytes(),
            AdminCredentials::hash_password("changemf").as_bytes()
        ));
        assert!(!constant_time_eq(b"admin", b"admin2"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_seed_does_not_overwrite() {
        let pool = create_in_memory_pool().await.unwrap();

        AdminCredentials::seed(&pool, "admin", "changeme").await.unwrap();
        AdminCredentials::seed(&pool, "other", "secret").await.unwrap();

        assert!(AdminCredentials::verify(&pool, "admin", "changeme").await.unwrap());
        assert!(!AdminCredentials::verify(&pool, "other", "secret").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_password() {
        let pool = create_in_memory_pool().await.unwrap();
        assert!(!AdminCredentials::verify(&pool, "admin", "changeme").await.unwrap());

        AdminCredentials::seed(&pool, "admin", "changeme").await.unwrap();
        AdminCredentials::update_password(&pool, "n3w-pass").await.unwrap();

        assert!(!AdminCredentials::verify(&pool, "admin", "changeme").await.unwrap());
        assert!(AdminCredentials::verify(&pool, "admin", "n3w-pass").await.unwrap());
    }
}
