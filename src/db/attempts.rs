use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::constants::RATE_LIMIT_LOCK_TIMEOUT_MS;
use crate::error::Result;
use crate::models::rate_limit::RateLimitScope;
use crate::rate_limit::AttemptStore;

/// Attempt log backed by the `auth_*_attempts` tables
#[derive(Clone)]
pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn check_and_record(
        &self,
        scope: RateLimitScope,
        key_hash: &str,
        max_attempts: i64,
        window: Duration,
    ) -> Result<bool> {
        // Table names come from a closed enum, never from request input
        let table = scope.table();
        let timeout = format!("{}ms", RATE_LIMIT_LOCK_TIMEOUT_MS);

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;

        // Serializes concurrent checks for one identity until commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{}:{}", table, key_hash))
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "DELETE FROM {} WHERE key = $1 AND ts < now() - make_interval(secs => $2)",
            table
        ))
        .bind(key_hash)
        .bind(window.as_secs_f64())
        .execute(&mut *tx)
        .await?;

        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {} WHERE key = $1", table))
                .bind(key_hash)
                .fetch_one(&mut *tx)
                .await?;

        if count >= max_attempts {
            tx.rollback().await?;
            return Ok(true);
        }

        sqlx::query(&format!("INSERT INTO {} (key) VALUES ($1)", table))
            .bind(key_hash)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(false)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
