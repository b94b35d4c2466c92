//! JWT issuance and verification
//! Access token + refresh token pair, both HS256-signed with the process-wide secret.

use crate::{config::AppConfig, error::{AppError, TokenError}};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACCESS: &str = "access";
pub const REFRESH: &str = "refresh";

/// JWT claims shared by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    /// "access" or "refresh"
    pub token_type: String,

    pub iat: i64,

    pub exp: i64,

    /// Unique token identifier; the registry key for refresh tokens
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSignature)
    }

    pub fn token_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.jti).map_err(|_| TokenError::InvalidSignature)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// Result of a login: both tokens plus the refresh claims the registry records
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access: String,
    pub refresh: String,
    pub refresh_claims: Claims,
}

/// Token issuer; built once from config and shared behind an `Arc`
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            Duration::seconds(config.security.access_token_exp_secs as i64),
            Duration::seconds(config.security.refresh_token_exp_secs as i64),
        )
    }

    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AppError> {
        // HS256 wants at least 32 bytes of key material
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Issue a fresh access/refresh pair for a user
    pub fn issue(&self, user_id: &Uuid, username: &str) -> Result<IssuedTokens, AppError> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit issuance instant
    pub fn issue_at(
        &self,
        user_id: &Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AppError> {
        let refresh_claims = self.claims(user_id, username, REFRESH, now, self.refresh_ttl);
        let refresh = self.sign(&refresh_claims)?;
        let access = self.issue_access_at(user_id, username, now)?;

        Ok(IssuedTokens {
            access,
            refresh,
            refresh_claims,
        })
    }

    /// Mint a lone access token
    pub fn issue_access(&self, user_id: &Uuid, username: &str) -> Result<String, AppError> {
        self.issue_access_at(user_id, username, Utc::now())
    }

    pub fn issue_access_at(
        &self,
        user_id: &Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = self.claims(user_id, username, ACCESS, now, self.access_ttl);
        self.sign(&claims)
    }

    /// Verify an access token (signature, expiry, token type)
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, ACCESS, true)
    }

    /// Verify a refresh token (signature, expiry, token type)
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, REFRESH, true)
    }

    /// Verify a refresh token's signature but accept it past expiry
    pub fn decode_refresh_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, REFRESH, false)
    }

    fn claims(
        &self,
        user_id: &Uuid,
        username: &str,
        token_type: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Claims {
        Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type: token_type.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode {} token: {:?}", claims.token_type, e);
            AppError::Internal(format!("Failed to encode {} token: {}", claims.token_type, e))
        })
    }

    fn decode_typed(&self, token: &str, expected: &str, check_exp: bool) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_exp;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    tracing::debug!("Token validation failed: {:?}", e);
                    TokenError::InvalidSignature
                }
            })?
            .claims;

        if claims.token_type != expected {
            tracing::debug!(
                "Token type mismatch: expected '{}', got '{}'",
                expected,
                claims.token_type
            );
            return Err(TokenError::InvalidSignature);
        }

        Ok(claims)
    }
}
