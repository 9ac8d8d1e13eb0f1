//! Database repository layer
//!
//! Services depend on the `UserStore` / `CompanyStore` traits; PostgreSQL and
//! in-memory implementations live side by side.

pub mod company_repo;
pub mod memory;
pub mod user_repo;

pub use company_repo::CompanyRepository;
pub use memory::{InMemoryCompanyStore, InMemoryUserStore};
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{Company, User},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Read access to stored credentials
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}

/// CRUD over Company records keyed by id
///
/// `update` and `delete` report whether a row was affected.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create(&self, company: &Company) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    async fn update(&self, company: &Company) -> Result<bool, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
