//! HTTP 处理器模块

pub mod auth;
pub mod category;
pub mod health;
pub mod portfolio;
pub mod team;
pub mod user;
