//! Company domain models

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Company record
///
/// `id` is assigned once before creation and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount_of_employees: i32,
    pub registered: bool,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub company_type: String,
}

/// Create company request (everything except the id)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "amount_of_employees must not be negative"))]
    pub amount_of_employees: i32,
    pub registered: bool,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type must not be empty"))]
    pub company_type: String,
}

impl CreateCompanyRequest {
    pub fn into_company(self, id: Uuid) -> Company {
        Company {
            id,
            name: self.name,
            description: self.description,
            amount_of_employees: self.amount_of_employees,
            registered: self.registered,
            company_type: self.company_type,
        }
    }
}

/// Partial update
///
/// Absent fields leave the stored value untouched. `description` is
/// tri-state: absent keeps it, `null` clears it, a string replaces it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompanyPatch {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    #[validate(range(min = 0, message = "amount_of_employees must not be negative"))]
    pub amount_of_employees: Option<i32>,
    #[serde(default)]
    pub registered: Option<bool>,
    #[serde(default, rename = "type")]
    #[validate(length(min = 1, message = "type must not be empty"))]
    pub company_type: Option<String>,
}

impl CompanyPatch {
    /// Merge present fields into `company`; the id is never touched
    pub fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(description) = self.description {
            company.description = description;
        }
        if let Some(amount) = self.amount_of_employees {
            company.amount_of_employees = amount;
        }
        if let Some(registered) = self.registered {
            company.registered = registered;
        }
        if let Some(company_type) = self.company_type {
            company.company_type = company_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.amount_of_employees.is_none()
            && self.registered.is_none()
            && self.company_type.is_none()
    }
}

// A present key (even `null`) becomes `Some`; a missing key stays `None`
// through `#[serde(default)]`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
