//! 认证服务：登录与令牌刷新

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher, TokenPair},
    error::AppError,
    repository::UserStore,
};
use std::sync::Arc;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            users,
            jwt_service,
            hasher,
        }
    }

    /// 用户登录
    ///
    /// 用户不存在和密码错误返回同一个错误，且都会执行一次 Argon2 校验。
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                tracing::info!(%username, "Login failed");
                return Err(self.hasher.verify_dummy(password));
            }
        };

        if let Err(e) = self.hasher.verify(password, &user.password_hash) {
            if matches!(e, AppError::InvalidCredentials) {
                tracing::info!(%username, "Login failed");
            }
            return Err(e);
        }

        let token_pair = self.jwt_service.generate_token_pair(&user.id)?;

        tracing::info!(user_id = %user.id, %username, "Login succeeded");

        Ok(token_pair)
    }

    /// 用刷新令牌换取新的访问令牌
    ///
    /// 刷新令牌不轮换，在自身过期前可重复使用。
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.jwt_service.validate_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let access_token = self.jwt_service.generate_access_token(&user_id)?;

        tracing::debug!(%user_id, "Access token refreshed");

        Ok(access_token)
    }
}
