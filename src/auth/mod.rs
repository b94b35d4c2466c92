//! Authentication: password hashing, JWT issuance, the refresh token registry
//! and the bearer middleware

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod registry;

pub use jwt::{Claims, IssuedTokens, TokenIssuer};
pub use middleware::{bearer_auth_middleware, extract_token, AuthContext};
pub use password::{validate_password_strength, PasswordHasher};
pub use registry::TokenRegistry;
