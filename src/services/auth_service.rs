//! 认证服务：注册、登录、令牌刷新

use crate::{
    auth::{validate_password_strength, PasswordHasher, TokenIssuer, TokenRegistry},
    error::AppError,
    models::{auth::*, user::*},
    repository::UserStore,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    registry: TokenRegistry,
    issuer: Arc<TokenIssuer>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        registry: TokenRegistry,
        issuer: Arc<TokenIssuer>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            registry,
            issuer,
            hasher,
        }
    }

    /// 用户注册（不会自动登录）
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        req.validate()?;
        validate_password_strength(&req.password)?;

        if self.users.username_exists(&req.username).await? {
            return Err(AppError::Duplicate { field: "username" });
        }
        if self.users.email_exists(&req.email).await? {
            return Err(AppError::Duplicate { field: "email" });
        }

        let RegisterRequest {
            username,
            email,
            password,
            first_name,
            last_name,
            phone_number,
            telegram,
            role,
            skills,
        } = req;

        let password_hash = self.hasher.hash_async(password).await?;

        // 并发注册的竞争由存储层唯一约束兜底
        let user = self
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
                first_name,
                last_name,
                phone_number,
                telegram,
                role,
                skills,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(UserResponse::from(user))
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;

        // 用户不存在与密码错误返回相同的错误
        let user = match self.users.find_by_username(&req.username).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Login failed: unknown username");
                return Err(self.hasher.verify_dummy(req.password).await);
            }
        };

        if let Err(e) = self
            .hasher
            .verify_async(req.password, user.password_hash.clone())
            .await
        {
            if matches!(e, AppError::InvalidCredentials) {
                tracing::debug!(user_id = %user.id, "Login failed: password mismatch");
            }
            return Err(e);
        }

        // 检查账户状态
        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login rejected: account disabled");
            return Err(AppError::AccountDisabled);
        }

        let tokens = self.issuer.issue(&user.id, &user.username)?;
        self.registry.record(&tokens.refresh_claims).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user: UserResponse::from(user),
        })
    }

    /// 刷新令牌：一次性兑换 refresh 令牌
    pub async fn refresh(&self, req: RefreshTokenRequest) -> Result<RefreshResponse, AppError> {
        req.validate()?;

        let access = self.registry.redeem(&req.refresh).await?;

        Ok(RefreshResponse { access })
    }

    /// 当前登录用户
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AppError::Unauthorized)
    }
}
