//! Refresh token registry
//!
//! Every refresh token minted at login is recorded by its `jti`. Redeeming a
//! token blacklists it in the same atomic step, so a refresh token yields at
//! most one access token even under concurrent presentation.

use crate::{
    auth::jwt::{Claims, TokenIssuer},
    error::{AppError, TokenError},
    models::auth::RefreshTokenRecord,
    repository::{RedeemOutcome, RefreshTokenStore},
};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct TokenRegistry {
    store: Arc<dyn RefreshTokenStore>,
    issuer: Arc<TokenIssuer>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn RefreshTokenStore>, issuer: Arc<TokenIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Record a freshly issued refresh token as active
    pub async fn record(&self, claims: &Claims) -> Result<(), AppError> {
        let record = RefreshTokenRecord {
            id: claims.token_id().map_err(AppError::Token)?,
            user_id: claims.user_id().map_err(AppError::Token)?,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            revoked_at: None,
        };

        self.store.insert(&record).await
    }

    /// Blacklist a refresh token and mint a new access token for its subject.
    ///
    /// The refresh token itself is consumed; no replacement refresh token is issued.
    pub async fn redeem(&self, token: &str) -> Result<String, AppError> {
        let claims = self.issuer.decode_refresh(token).map_err(AppError::Token)?;
        let token_id = claims.token_id().map_err(AppError::Token)?;

        let user_id = match self.store.redeem(token_id, Utc::now()).await? {
            RedeemOutcome::Redeemed { user_id } => user_id,
            RedeemOutcome::NotFound => return Err(AppError::Token(TokenError::NotFound)),
            RedeemOutcome::Revoked => {
                tracing::warn!(jti = %token_id, "Refresh token reuse rejected");
                return Err(AppError::Token(TokenError::Revoked));
            }
            RedeemOutcome::Expired => return Err(AppError::Token(TokenError::Expired)),
        };

        tracing::debug!(jti = %token_id, user_id = %user_id, "Refresh token redeemed");

        self.issuer.issue_access(&user_id, &claims.username)
    }

    /// Blacklist a refresh token without minting anything. Idempotent; an
    /// expired but correctly signed token is still accepted.
    pub async fn blacklist(&self, token: &str) -> Result<(), AppError> {
        let claims = self
            .issuer
            .decode_refresh_ignoring_expiry(token)
            .map_err(AppError::Token)?;

        let now = Utc::now();
        let record = RefreshTokenRecord {
            id: claims.token_id().map_err(AppError::Token)?,
            user_id: claims.user_id().map_err(AppError::Token)?,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            revoked_at: Some(now),
        };

        self.store.revoke(&record).await
    }

    /// Drop records past their expiry; they can no longer be redeemed anyway
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.store.purge_expired(Utc::now()).await
    }
}
