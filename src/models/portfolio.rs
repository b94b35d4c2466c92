//! Portfolio item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Portfolio item as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub demo_video: String,
    pub team_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload (PUT replaces every field)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PortfolioRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: String,
    #[validate(length(min = 1, max = 2048, message = "Image reference must be 1-2048 characters."))]
    pub image: String,
    #[validate(custom(function = "validate_http_link", message = "Invalid link."))]
    pub link: String,
    #[validate(custom(function = "validate_http_link", message = "Invalid link."))]
    pub demo_video: String,
    pub team_id: Uuid,
}

fn validate_http_link(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_link"))
    }
}
