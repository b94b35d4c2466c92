//! Team repository (Postgres)

use super::{is_foreign_key_violation, map_unique_violation, TeamStore};
use crate::{
    error::AppError,
    models::{team::Team, user::User},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const TEAM_CONSTRAINTS: &[(&str, &str)] = &[("teams_name_key", "name")];

pub struct TeamRepository {
    db: PgPool,
}

impl TeamRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn unknown_member(err: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::field("members", "User does not exist.")
    } else {
        AppError::Database(err)
    }
}

#[async_trait]
impl TeamStore for TeamRepository {
    async fn create(&self, name: &str, members: &[Uuid]) -> Result<Team, AppError> {
        let mut tx = self.db.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, TEAM_CONSTRAINTS))?;

        if !members.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO team_members (team_id, user_id)
                SELECT $1, m FROM UNNEST($2::uuid[]) AS m
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(team.id)
            .bind(members)
            .execute(&mut *tx)
            .await
            .map_err(unknown_member)?;
        }

        tx.commit().await?;

        Ok(team)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>("SELECT id, name FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(team)
    }

    async fn members(&self, team_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            JOIN team_members tm ON tm.user_id = u.id
            WHERE tm.team_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Team>, AppError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id
            WHERE tm.user_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(teams)
    }

    async fn rename(&self, id: Uuid, name: &str) -> Result<Option<Team>, AppError> {
        sqlx::query_as::<_, Team>("UPDATE teams SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, TEAM_CONSTRAINTS))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(unknown_member)?;

        Ok(())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
