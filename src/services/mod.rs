//! Business logic services layer

pub mod auth_service;
pub mod company_service;

pub use auth_service::AuthService;
pub use company_service::CompanyService;
