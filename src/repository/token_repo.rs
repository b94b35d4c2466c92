//! Refresh token registry repository (Postgres)

use super::{RedeemOutcome, RefreshTokenStore};
use crate::{error::AppError, models::auth::RefreshTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TokenRepository {
    db: PgPool,
}

impl TokenRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStore for TokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, issued_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, AppError> {
        let record =
            sqlx::query_as::<_, RefreshTokenRecord>("SELECT * FROM refresh_tokens WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(record)
    }

    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<RedeemOutcome, AppError> {
        // Single-statement CAS: only one concurrent caller can flip revoked_at
        let redeemed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2
            WHERE id = $1 AND revoked_at IS NULL AND expires_at > $2
            RETURNING user_id
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;

        if let Some(user_id) = redeemed {
            return Ok(RedeemOutcome::Redeemed { user_id });
        }

        let outcome = match self.find(id).await? {
            None => RedeemOutcome::NotFound,
            Some(record) if record.is_revoked() => RedeemOutcome::Revoked,
            Some(_) => RedeemOutcome::Expired,
        };

        Ok(outcome)
    }

    async fn revoke(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let revoked_at = record.revoked_at.unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, issued_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET revoked_at = COALESCE(refresh_tokens.revoked_at, EXCLUDED.revoked_at)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(revoked_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
