//! Portfolio repository (Postgres)

use super::{is_foreign_key_violation, PortfolioStore};
use crate::{
    error::AppError,
    models::portfolio::{PortfolioItem, PortfolioRequest},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PortfolioRepository {
    db: PgPool,
}

impl PortfolioRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn unknown_team(err: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::field("team_id", "Team does not exist.")
    } else {
        AppError::Database(err)
    }
}

#[async_trait]
impl PortfolioStore for PortfolioRepository {
    async fn create(&self, req: &PortfolioRequest) -> Result<PortfolioItem, AppError> {
        sqlx::query_as::<_, PortfolioItem>(
            r#"
            INSERT INTO portfolio_items (id, name, description, image, link, demo_video, team_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.image)
        .bind(&req.link)
        .bind(&req.demo_video)
        .bind(req.team_id)
        .fetch_one(&self.db)
        .await
        .map_err(unknown_team)
    }

    async fn find(&self, id: Uuid) -> Result<Option<PortfolioItem>, AppError> {
        let item = sqlx::query_as::<_, PortfolioItem>("SELECT * FROM portfolio_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(item)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PortfolioItem>, AppError> {
        let items = sqlx::query_as::<_, PortfolioItem>(
            "SELECT * FROM portfolio_items ORDER BY created_at DESC, name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &PortfolioRequest,
    ) -> Result<Option<PortfolioItem>, AppError> {
        sqlx::query_as::<_, PortfolioItem>(
            r#"
            UPDATE portfolio_items
            SET
                name = $2,
                description = $3,
                image = $4,
                link = $5,
                demo_video = $6,
                team_id = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.image)
        .bind(&req.link)
        .bind(&req.demo_video)
        .bind(req.team_id)
        .fetch_optional(&self.db)
        .await
        .map_err(unknown_team)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM portfolio_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
