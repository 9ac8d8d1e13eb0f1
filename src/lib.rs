//! Company 管理服务
//!
//! 提供 Company 记录的增删改查、JWT 访问/刷新令牌以及变更事件投递

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
