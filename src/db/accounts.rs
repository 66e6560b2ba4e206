use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::account::CredentialStore;

const UNIQUE_VIOLATION: &str = "23505";

/// Users and owners in Postgres. Password hashing and comparison run inside
/// the database through `pgcrypto`.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, email: &str, password: &str) -> Result<String> {
        let mut tx = self.pool.begin().await?;

        let inserted: std::result::Result<(String,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO users (email, password_hash) \
             VALUES ($1, crypt($2, gen_salt('bf', 12))) \
             RETURNING id::text",
        )
        .bind(email)
        .bind(password)
        .fetch_one(&mut *tx)
        .await;

        let (user_id,) = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                tx.rollback().await?;
                tracing::info!("Registration rejected: email already exists");
                return Err(AppError::AlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("INSERT INTO owners (kind, user_id) VALUES ('user', $1::uuid)")
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, "New user registered");
        Ok(user_id)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id::text FROM users \
             WHERE lower(email) = $1 AND password_hash = crypt($2, password_hash) \
             LIMIT 1",
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }
}
