//! Storage layer
//!
//! Each collaborator is a trait so the service can run on Postgres or on the
//! in-memory backend (local runs and the test-suite). Both enforce the same
//! uniqueness and atomicity rules.

pub mod category_repo;
pub mod memory;
pub mod portfolio_repo;
pub mod team_repo;
pub mod token_repo;
pub mod user_repo;

pub use category_repo::CategoryRepository;
pub use memory::MemoryStore;
pub use portfolio_repo::PortfolioRepository;
pub use team_repo::TeamRepository;
pub use token_repo::TokenRepository;
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{
        auth::RefreshTokenRecord,
        category::{Category, CategoryRequest},
        portfolio::{PortfolioItem, PortfolioRequest},
        team::Team,
        user::{NewUser, User},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; username/email conflicts surface as `AppError::Duplicate`
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;

    /// Activate or deactivate an account; false if the user does not exist
    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, AppError>;
}

/// Outcome of an atomic redeem attempt on a refresh token record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The record was active and is now blacklisted
    Redeemed { user_id: Uuid },
    NotFound,
    Revoked,
    Expired,
}

/// Refresh token registry storage
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Compare-and-set: blacklist the record only if it is active and unexpired at `now`
    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<RedeemOutcome, AppError>;

    /// Mark revoked whatever the current state; inserts the record if unknown
    async fn revoke(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    /// Delete records that expired before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Create a team; a taken name is `Duplicate { field: "name" }`
    async fn create(&self, name: &str, members: &[Uuid]) -> Result<Team, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Team>, AppError>;

    async fn members(&self, team_id: Uuid) -> Result<Vec<User>, AppError>;

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Team>, AppError>;

    async fn rename(&self, id: Uuid, name: &str) -> Result<Option<Team>, AppError>;

    /// Delete a team and, by cascade, its portfolio items
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Idempotent
    async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// A missing team is reported as a `team_id` validation error
    async fn create(&self, req: &PortfolioRequest) -> Result<PortfolioItem, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<PortfolioItem>, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PortfolioItem>, AppError>;

    async fn update(
        &self,
        id: Uuid,
        req: &PortfolioRequest,
    ) -> Result<Option<PortfolioItem>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create(&self, req: &CategoryRequest) -> Result<Category, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Category>, AppError>;

    async fn list(&self) -> Result<Vec<Category>, AppError>;

    async fn update(&self, id: Uuid, req: &CategoryRequest) -> Result<Option<Category>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// The full set of stores handed to services and handlers
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn RefreshTokenStore>,
    pub teams: Arc<dyn TeamStore>,
    pub portfolio: Arc<dyn PortfolioStore>,
    pub categories: Arc<dyn CategoryStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            tokens: Arc::new(TokenRepository::new(pool.clone())),
            teams: Arc::new(TeamRepository::new(pool.clone())),
            portfolio: Arc::new(PortfolioRepository::new(pool.clone())),
            categories: Arc::new(CategoryRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tokens: store.clone(),
            teams: store.clone(),
            portfolio: store.clone(),
            categories: store,
        }
    }
}

/// Map a unique-constraint violation onto `AppError::Duplicate` using the
/// constraint name; anything else stays a database error.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    constraints: &[(&str, &'static str)],
) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                if let Some((_, field)) = constraints.iter().find(|(name, _)| *name == constraint) {
                    return AppError::Duplicate { field: *field };
                }
            }
        }
    }
    AppError::Database(err)
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_foreign_key_violation())
        .unwrap_or(false)
}
