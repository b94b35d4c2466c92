//! Data models

pub mod auth;
pub mod category;
pub mod portfolio;
pub mod team;
pub mod user;
