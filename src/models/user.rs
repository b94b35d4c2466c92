//! User domain models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{3,15}$").unwrap());

/// Marketplace role of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Superadmin,
    Pm,
    Developer,
    #[default]
    NotAssigned,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => "superadmin",
            UserRole::Pm => "pm",
            UserRole::Developer => "developer",
            UserRole::NotAssigned => "not_assigned",
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "superadmin" => UserRole::Superadmin,
            "pm" => UserRole::Pm,
            "developer" => UserRole::Developer,
            _ => UserRole::NotAssigned,
        }
    }
}

/// User account as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,

    // Profile
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub telegram: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    #[sqlx(json)]
    pub skills: Vec<String>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub telegram: Option<String>,
    pub role: UserRole,
    pub skills: Vec<String>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters."))]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Email must be at most 255 characters.")
    )]
    pub email: String,
    pub password: String,
    #[validate(length(max = 30, message = "First name must be at most 30 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 30, message = "Last name must be at most 30 characters."))]
    pub last_name: Option<String>,
    #[validate(
        length(max = 15, message = "Phone number must be at most 15 characters."),
        regex(path = *PHONE_RE, message = "Enter a valid phone number.")
    )]
    pub phone_number: Option<String>,
    #[validate(length(max = 255, message = "Telegram handle must be at most 255 characters."))]
    pub telegram: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// User response (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub telegram: Option<String>,
    pub role: UserRole,
    pub skills: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            telegram: user.telegram,
            role: user.role,
            skills: user.skills,
        }
    }
}
