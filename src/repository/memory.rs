//! In-memory backend
//!
//! One `RwLock` guards every table, so each trait method is atomic with
//! respect to the others: uniqueness checks and the refresh-token CAS happen
//! under a single write guard. Used for local runs (`storage.backend = "memory"`)
//! and by the test-suite.

use super::{
    CategoryStore, PortfolioStore, RedeemOutcome, RefreshTokenStore, TeamStore, UserStore,
};
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
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<Uuid, RefreshTokenRecord>,
    teams: HashMap<Uuid, Team>,
    /// (team_id, user_id)
    team_members: BTreeSet<(Uuid, Uuid)>,
    portfolio: HashMap<Uuid, PortfolioItem>,
    categories: HashMap<Uuid, Category>,
}

impl Tables {
    fn team_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.teams
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Duplicate { field: "username" });
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Duplicate { field: "email" });
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            telegram: user.telegram.clone(),
            role: user.role,
            skills: user.skills.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.email == email))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });

        Ok(page(users, limit, offset))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.refresh_tokens.contains_key(&record.id) {
            return Err(AppError::Internal(format!(
                "refresh token {} already recorded",
                record.id
            )));
        }
        tables.refresh_tokens.insert(record.id, record.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self.tables.read().await.refresh_tokens.get(&id).cloned())
    }

    async fn redeem(&self, id: Uuid, now: DateTime<Utc>) -> Result<RedeemOutcome, AppError> {
        let mut tables = self.tables.write().await;

        let outcome = match tables.refresh_tokens.get_mut(&id) {
            None => RedeemOutcome::NotFound,
            Some(record) if record.is_revoked() => RedeemOutcome::Revoked,
            Some(record) if record.is_expired_at(now) => RedeemOutcome::Expired,
            Some(record) => {
                record.revoked_at = Some(now);
                RedeemOutcome::Redeemed {
                    user_id: record.user_id,
                }
            }
        };

        Ok(outcome)
    }

    async fn revoke(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let revoked_at = record.revoked_at.unwrap_or_else(Utc::now);

        tables
            .refresh_tokens
            .entry(record.id)
            .and_modify(|existing| {
                existing.revoked_at.get_or_insert(revoked_at);
            })
            .or_insert_with(|| RefreshTokenRecord {
                revoked_at: Some(revoked_at),
                ..record.clone()
            });

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, r| r.expires_at >= now);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create(&self, name: &str, members: &[Uuid]) -> Result<Team, AppError> {
        let mut tables = self.tables.write().await;

        if tables.team_name_taken(name, None) {
            return Err(AppError::Duplicate { field: "name" });
        }
        if members.iter().any(|id| !tables.users.contains_key(id)) {
            return Err(AppError::field("members", "User does not exist."));
        }

        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        tables.teams.insert(team.id, team.clone());
        for user_id in members {
            tables.team_members.insert((team.id, *user_id));
        }

        Ok(team)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Team>, AppError> {
        Ok(self.tables.read().await.teams.get(&id).cloned())
    }

    async fn members(&self, team_id: Uuid) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .team_members
            .iter()
            .filter(|(t, _)| *t == team_id)
            .filter_map(|(_, u)| tables.users.get(u).cloned())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(users)
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Team>, AppError> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables
            .team_members
            .iter()
            .filter(|(_, u)| *u == user_id)
            .filter_map(|(t, _)| tables.teams.get(t).cloned())
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(teams)
    }

    async fn rename(&self, id: Uuid, name: &str) -> Result<Option<Team>, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.teams.contains_key(&id) {
            return Ok(None);
        }
        if tables.team_name_taken(name, Some(id)) {
            return Err(AppError::Duplicate { field: "name" });
        }

        Ok(tables.teams.get_mut(&id).map(|team| {
            team.name = name.to_string();
            team.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.teams.remove(&id).is_none() {
            return Ok(false);
        }
        tables.team_members.retain(|(t, _)| *t != id);
        tables.portfolio.retain(|_, item| item.team_id != id);

        Ok(true)
    }

    async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&team_id) {
            return Err(AppError::NotFound("Team"));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::field("members", "User does not exist."));
        }
        tables.team_members.insert((team_id, user_id));

        Ok(())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .team_members
            .remove(&(team_id, user_id));

        Ok(())
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn create(&self, req: &PortfolioRequest) -> Result<PortfolioItem, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.teams.contains_key(&req.team_id) {
            return Err(AppError::field("team_id", "Team does not exist."));
        }

        let now = Utc::now();
        let item = PortfolioItem {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            description: req.description.clone(),
            image: req.image.clone(),
            link: req.link.clone(),
            demo_video: req.demo_video.clone(),
            team_id: req.team_id,
            created_at: now,
            updated_at: now,
        };
        tables.portfolio.insert(item.id, item.clone());

        Ok(item)
    }

    async fn find(&self, id: Uuid) -> Result<Option<PortfolioItem>, AppError> {
        Ok(self.tables.read().await.portfolio.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PortfolioItem>, AppError> {
        let tables = self.tables.read().await;
        let mut items: Vec<PortfolioItem> = tables.portfolio.values().cloned().collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(page(items, limit, offset))
    }

    async fn update(
        &self,
        id: Uuid,
        req: &PortfolioRequest,
    ) -> Result<Option<PortfolioItem>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.portfolio.contains_key(&id) {
            return Ok(None);
        }
        if !tables.teams.contains_key(&req.team_id) {
            return Err(AppError::field("team_id", "Team does not exist."));
        }

        Ok(tables.portfolio.get_mut(&id).map(|item| {
            item.name = req.name.clone();
            item.description = req.description.clone();
            item.image = req.image.clone();
            item.link = req.link.clone();
            item.demo_video = req.demo_video.clone();
            item.team_id = req.team_id;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.portfolio.remove(&id).is_some())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create(&self, req: &CategoryRequest) -> Result<Category, AppError> {
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            description: req.description.clone(),
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .categories
            .insert(category.id, category.clone());

        Ok(category)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn update(&self, id: Uuid, req: &CategoryRequest) -> Result<Option<Category>, AppError> {
        let mut tables = self.tables.write().await;

        Ok(tables.categories.get_mut(&id).map(|category| {
            category.name = req.name.clone();
            category.description = req.description.clone();
            category.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.categories.remove(&id).is_some())
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}
