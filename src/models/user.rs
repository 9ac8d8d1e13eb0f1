//! User domain models

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored credential; owned by the user store, read-only here
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
