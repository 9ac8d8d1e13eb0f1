//! 数据库连接池与迁移管理
//!
//! 存储层可以不接数据库（内存存储），因此就绪检查接受可选的连接池：
//! 未配置数据库时不产生 database 检查项。

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 按配置构建连接池参数（不建立连接）
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
}

/// 创建 companies/users 存储使用的连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = pool_options(config)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to company database");
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Company database pool ready"
    );

    Ok(pool)
}

/// 执行 migrations/ 下的建表脚本
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Migration failed");
            DbError::MigrationFailed(e.to_string())
        })?;

    tracing::info!("Migrations applied");
    Ok(())
}

/// 对连接池执行 `SELECT 1`
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 就绪检查用：未配置数据库时返回 None
pub async fn database_status(pool: Option<&PgPool>) -> Option<HealthStatus> {
    match pool {
        Some(pool) => Some(health_check(pool).await),
        None => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }

    /// 失败原因
    pub fn message(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Unhealthy(msg) => Some(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn database_config() -> DatabaseConfig {
        DatabaseConfig {
            url: Secret::new("postgresql://localhost/company_service".to_string()),
            max_connections: 8,
            min_connections: 2,
            acquire_timeout_secs: 3,
            idle_timeout_secs: 60,
            max_lifetime_secs: 600,
        }
    }

    #[test]
    fn test_pool_options_follow_config() {
        let options = pool_options(&database_config());

        assert_eq!(options.get_max_connections(), 8);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(600)));
        assert!(options.get_test_before_acquire());
    }

    #[tokio::test]
    async fn test_no_pool_means_no_database_status() {
        assert_eq!(database_status(None).await, None);
    }

    #[test]
    fn test_health_status_accessors() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert_eq!(HealthStatus::Healthy.as_str(), "healthy");
        assert_eq!(HealthStatus::Healthy.message(), None);

        let down = HealthStatus::Unhealthy("pool timed out".to_string());
        assert!(!down.is_healthy());
        assert_eq!(down.as_str(), "unhealthy");
        assert_eq!(down.message(), Some("pool timed out"));
    }

    #[test]
    fn test_db_error_messages() {
        let err = DbError::MigrationFailed("checksum mismatch".to_string());
        assert_eq!(err.to_string(), "Migration failed: checksum mismatch");
    }
}
