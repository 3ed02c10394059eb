// src/db/tenancy_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::db_utils::map_unique_violation;
use crate::common::error::AppError;
use crate::models::tenancy::{Company, Department, DepartmentScope, Site, UpdateCompanyPayload};

// Empresas, sites e departamentos. A exclusão em cascata fica a cargo das FKs.
/// Sem estado: cada método recebe o executor (pool ou transação) de quem chama.
#[derive(Clone, Default)]
pub struct TenantRepository;

impl TenantRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  EMPRESAS
    // =========================================================================

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        description: Option<&str>,
        industry: Option<&str>,
        website: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, slug, description, industry, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(industry)
        .bind(website)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, format!("Já existe uma empresa com o slug '{}'.", slug)))
    }

    /// Lista empresas; `only` restringe a uma empresa (usuários que não são super_admin).
    pub async fn list_companies<'e, E>(&self, executor: E, only: Option<Uuid>) -> Result<Vec<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT * FROM companies
            WHERE ($1::uuid IS NULL OR id = $1)
            ORDER BY name ASC
            "#,
        )
        .bind(only)
        .fetch_all(executor)
        .await?;

        Ok(companies)
    }

    pub async fn find_company<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(company)
    }

    pub async fn update_company<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                industry = COALESCE($4, industry),
                website = COALESCE($5, website),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.industry.as_deref())
        .bind(input.website.as_deref())
        .bind(input.is_active)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    /// Remove a empresa (e, por cascata, sites, departamentos, usuários, templates e pesquisas).
    pub async fn delete_company<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  SITES
    // =========================================================================

    pub async fn create_site<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        address: Option<&str>,
    ) -> Result<Site, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (company_id, name, address)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(address)
        .fetch_one(executor)
        .await?;

        Ok(site)
    }

    pub async fn list_sites<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Site>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE company_id = $1 ORDER BY name ASC")
            .bind(company_id)
            .fetch_all(executor)
            .await?;

        Ok(sites)
    }

    pub async fn find_site<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Site>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(site)
    }

    pub async fn delete_site<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  DEPARTAMENTOS
    // =========================================================================

    pub async fn create_department<'e, E>(
        &self,
        executor: E,
        site_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Department, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (site_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(site_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(department)
    }

    pub async fn list_departments<'e, E>(&self, executor: E, site_id: Uuid) -> Result<Vec<Department>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let departments =
            sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE site_id = $1 ORDER BY name ASC")
                .bind(site_id)
                .fetch_all(executor)
                .await?;

        Ok(departments)
    }

    /// Departamento com o site e a empresa aos quais pertence.
    pub async fn find_department_scope<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<DepartmentScope>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let scope = sqlx::query_as::<_, DepartmentScope>(
            r#"
            SELECT d.id AS department_id, d.site_id, s.company_id
            FROM departments d
            JOIN sites s ON s.id = d.site_id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(scope)
    }

    pub async fn delete_department<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
