//! Company 服务：创建、查询、部分更新、删除
//!
//! 每次调用都直接访问存储，没有缓存。update 是不带版本校验的读-改-写，
//! 同一记录的并发更新以最后写入者为准。

use crate::{
    error::AppError,
    events::{EventPublisher, MutationEvent},
    models::{Company, CompanyPatch},
    repository::CompanyStore,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct CompanyService {
    store: Arc<dyn CompanyStore>,
    events: Arc<dyn EventPublisher>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn CompanyStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    /// 保存新记录（id 由调用方预先生成）
    pub async fn create(&self, company: &Company) -> Result<(), AppError> {
        self.store.create(company).await?;

        tracing::info!(company_id = %company.id, name = %company.name, "Company created");
        self.events.publish(MutationEvent::created(company.clone()));

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Company, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(&format!("company {}", id)))
    }

    /// 部分更新：补丁中出现的字段覆盖，未出现的保留
    pub async fn update(&self, id: Uuid, patch: CompanyPatch) -> Result<Company, AppError> {
        let mut company = self.get(id).await?;

        if patch.is_empty() {
            tracing::debug!(company_id = %id, "Empty patch, record written back unchanged");
        }
        patch.apply_to(&mut company);

        // 读取之后记录被删除
        if !self.store.update(&company).await? {
            return Err(AppError::not_found(&format!("company {}", id)));
        }

        tracing::info!(company_id = %id, "Company updated");
        self.events.publish(MutationEvent::updated(company.clone()));

        Ok(company)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(AppError::not_found(&format!("company {}", id)));
        }

        tracing::info!(company_id = %id, "Company deleted");
        self.events.publish(MutationEvent::deleted(id));

        Ok(())
    }
}
