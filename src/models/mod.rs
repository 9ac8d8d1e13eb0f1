//! 数据模型模块

pub mod auth;
pub mod company;
pub mod user;

pub use company::{Company, CompanyPatch, CreateCompanyRequest};
pub use user::User;
