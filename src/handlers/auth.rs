//! 认证相关的 HTTP 处理器

use crate::{
    error::AppError,
    handlers::ValidatedJson,
    middleware::AppState,
    models::auth::{LoginRequest, RefreshTokenRequest, RefreshTokenResponse},
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_pair = state
        .auth_service
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(token_pair))
}

/// 刷新访问令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let access_token = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshTokenResponse { access_token }))
}
