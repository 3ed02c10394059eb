// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Company (A "Empresa", raiz do tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Acme Ltda")]
    pub name: String,
    #[schema(example = "acme-ltda")]
    pub slug: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Site (Unidade física da empresa)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Fábrica Campinas")]
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Department (pertence a exatamente um Site)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub site_id: Uuid,
    #[schema(example = "Recursos Humanos")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Departamento junto com a empresa do seu site (para a checagem de escopo)
#[derive(Debug, Clone, FromRow)]
pub struct DepartmentScope {
    pub department_id: Uuid,
    pub site_id: Uuid,
    pub company_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: String,
    // Se ausente, é gerado a partir do nome
    #[validate(length(min = 1, max = 80, message = "O slug deve ter entre 1 e 80 caracteres."))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSitePayload {
    #[validate(length(min = 1, message = "O nome do site é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentPayload {
    #[validate(length(min = 1, message = "O nome do departamento é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

/// Gera o slug da empresa: minúsculas ASCII, qualquer outra sequência vira `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme  Ltda."), "acme-ltda");
        assert_eq!(slugify("  --Quick NPS 2025--  "), "quick-nps-2025");
        assert_eq!(slugify("São Paulo"), "s-o-paulo");
        assert_eq!(slugify("!!!"), "");
    }
}
