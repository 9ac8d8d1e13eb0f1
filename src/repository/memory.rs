//! In-memory stores, used by tests and local runs without PostgreSQL

use crate::{
    error::AppError,
    models::{Company, User},
    repository::{CompanyStore, UserStore},
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with an already-hashed password and return it
    pub fn insert(&self, username: &str, password_hash: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(username.to_string(), user.clone());
        user
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }
}

#[derive(Default)]
pub struct InMemoryCompanyStore {
    companies: DashMap<Uuid, Company>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn create(&self, company: &Company) -> Result<(), AppError> {
        if self.companies.contains_key(&company.id) {
            return Err(AppError::Internal(format!(
                "duplicate company id {}",
                company.id
            )));
        }
        self.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.companies.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, company: &Company) -> Result<bool, AppError> {
        match self.companies.get_mut(&company.id) {
            Some(mut entry) => {
                *entry = company.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.companies.remove(&id).is_some())
    }
}
