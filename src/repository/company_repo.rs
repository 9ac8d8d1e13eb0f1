//! Company repository (公司数据访问)

use crate::{error::AppError, models::Company, repository::CompanyStore};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct CompanyRepository {
    db: PgPool,
}

impl CompanyRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CompanyStore for CompanyRepository {
    async fn create(&self, company: &Company) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, description, amount_of_employees, registered, type)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.amount_of_employees)
        .bind(company.registered)
        .bind(&company.company_type)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, description, amount_of_employees, registered, type
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(company)
    }

    /// 整行覆盖写入，不做版本校验
    async fn update(&self, company: &Company) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, description = $3, amount_of_employees = $4, registered = $5, type = $6
            WHERE id = $1
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.amount_of_employees)
        .bind(company.registered)
        .bind(&company.company_type)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
