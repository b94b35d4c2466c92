//! 生态市场后端
//! 账户注册、JWT 认证（一次性 refresh 令牌）以及团队、作品集、分类管理

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
