//! Company CRUD 处理器

use crate::{
    auth::AuthContext,
    error::AppError,
    handlers::{parse_id, ValidatedJson},
    middleware::AppState,
    models::{CompanyPatch, CreateCompanyRequest},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 创建 Company，id 由服务端生成
pub async fn create_company(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let company = req.into_company(Uuid::new_v4());

    state.company_service.create(&company).await?;

    tracing::debug!(actor = %auth.user_id, company_id = %company.id, "create_company");

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let company = state.company_service.get(id).await?;

    Ok(Json(company))
}

/// 部分更新，返回合并后的记录
pub async fn update_company(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<CompanyPatch>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let company = state.company_service.update(id, patch).await?;

    tracing::debug!(actor = %auth.user_id, company_id = %id, "update_company");

    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    state.company_service.delete(id).await?;

    tracing::debug!(actor = %auth.user_id, company_id = %id, "delete_company");

    Ok(StatusCode::NO_CONTENT)
}
