// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, Entity},
    db::TenantRepository,
    models::tenancy::{
        slugify, Company, CreateCompanyPayload, CreateDepartmentPayload, CreateSitePayload, Department, Site,
        UpdateCompanyPayload,
    },
    services::access_policy::{authorize, decide, Action, Actor, Resource, ResourceKind, TenantScope},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    // =========================================================================
    //  EMPRESAS
    // =========================================================================

    pub async fn create_company(&self, actor: &Actor, payload: CreateCompanyPayload) -> Result<Company, AppError> {
        payload.validate()?;
        authorize(actor, &Resource::new(ResourceKind::Company, TenantScope::default()), Action::Create)?;

        // Slug explícito também passa pela normalização
        let slug = slugify(payload.slug.as_deref().unwrap_or(&payload.name));
        if slug.is_empty() {
            return Err(AppError::InvalidInput(
                "Não foi possível gerar um slug a partir do nome informado.".into(),
            ));
        }

        let company = self
            .tenant_repo
            .create_company(
                &self.pool,
                payload.name.trim(),
                &slug,
                payload.description.as_deref(),
                payload.industry.as_deref(),
                payload.website.as_deref(),
            )
            .await?;

        tracing::info!(company_id = %company.id, slug = %company.slug, "empresa criada");
        Ok(company)
    }

    pub async fn list_companies(&self, actor: &Actor) -> Result<Vec<Company>, AppError> {
        if actor.is_super_admin() {
            return self.tenant_repo.list_companies(&self.pool, None).await;
        }

        match actor.scope.company_id {
            Some(company_id) => self.tenant_repo.list_companies(&self.pool, Some(company_id)).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_company(&self, actor: &Actor, id: Uuid) -> Result<Company, AppError> {
        // Qualquer membro enxerga a própria empresa
        if !actor.is_super_admin() && actor.scope.company_id != Some(id) {
            return Err(AppError::NotFound(Entity::Company));
        }

        self.tenant_repo
            .find_company(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Company))
    }

    pub async fn update_company(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        payload.validate()?;
        let company = self.get_company(actor, id).await?;
        authorize(actor, &Resource::new(ResourceKind::Company, TenantScope::company(Some(company.id))), Action::Update)?;

        self.tenant_repo
            .update_company(&self.pool, id, &payload)
            .await?
            .ok_or(AppError::NotFound(Entity::Company))
    }

    pub async fn delete_company(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let company = self.get_company(actor, id).await?;
        authorize(actor, &Resource::new(ResourceKind::Company, TenantScope::company(Some(company.id))), Action::Delete)?;

        if !self.tenant_repo.delete_company(&self.pool, id).await? {
            return Err(AppError::NotFound(Entity::Company));
        }

        tracing::info!(company_id = %id, by = %actor.user_id, "empresa excluída");
        Ok(())
    }

    // =========================================================================
    //  SITES
    // =========================================================================

    pub async fn create_site(&self, actor: &Actor, company_id: Uuid, payload: CreateSitePayload) -> Result<Site, AppError> {
        payload.validate()?;
        let company = self.get_company(actor, company_id).await?;

        // O site ainda não existe: o alvo é "um site qualquer da empresa"
        authorize(actor, &Resource::new(ResourceKind::Site, TenantScope::company(Some(company.id))), Action::Create)?;

        self.tenant_repo
            .create_site(&self.pool, company.id, payload.name.trim(), payload.address.as_deref())
            .await
    }

    /// Sites da empresa que o ator pode ler.
    pub async fn list_sites(&self, actor: &Actor, company_id: Uuid) -> Result<Vec<Site>, AppError> {
        let company = self.get_company(actor, company_id).await?;
        let sites = self.tenant_repo.list_sites(&self.pool, company.id).await?;

        Ok(sites
            .into_iter()
            .filter(|site| {
                let res = Resource::new(ResourceKind::Site, TenantScope::site(site.company_id, site.id));
                decide(actor, &res, Action::Read).is_allowed()
            })
            .collect())
    }

    async fn load_site(&self, actor: &Actor, site_id: Uuid) -> Result<Site, AppError> {
        let site = self
            .tenant_repo
            .find_site(&self.pool, site_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Site))?;

        if !actor.is_super_admin() && actor.scope.company_id != Some(site.company_id) {
            return Err(AppError::NotFound(Entity::Site));
        }

        Ok(site)
    }

    pub async fn delete_site(&self, actor: &Actor, site_id: Uuid) -> Result<(), AppError> {
        let site = self.load_site(actor, site_id).await?;
        authorize(actor, &Resource::new(ResourceKind::Site, TenantScope::site(site.company_id, site.id)), Action::Delete)?;

        self.tenant_repo.delete_site(&self.pool, site.id).await?;
        tracing::info!(site_id = %site.id, by = %actor.user_id, "site excluído");
        Ok(())
    }

    // =========================================================================
    //  DEPARTAMENTOS
    // =========================================================================

    pub async fn create_department(
        &self,
        actor: &Actor,
        site_id: Uuid,
        payload: CreateDepartmentPayload,
    ) -> Result<Department, AppError> {
        payload.validate()?;
        let site = self.load_site(actor, site_id).await?;

        authorize(
            actor,
            &Resource::new(ResourceKind::Department, TenantScope::site(site.company_id, site.id)),
            Action::Create,
        )?;

        self.tenant_repo
            .create_department(&self.pool, site.id, payload.name.trim(), payload.description.as_deref())
            .await
    }

    pub async fn list_departments(&self, actor: &Actor, site_id: Uuid) -> Result<Vec<Department>, AppError> {
        let site = self.load_site(actor, site_id).await?;
        let departments = self.tenant_repo.list_departments(&self.pool, site.id).await?;

        Ok(departments
            .into_iter()
            .filter(|d| {
                let res = Resource::new(ResourceKind::Department, TenantScope::department(site.company_id, site.id, d.id));
                decide(actor, &res, Action::Read).is_allowed()
            })
            .collect())
    }

    pub async fn delete_department(&self, actor: &Actor, department_id: Uuid) -> Result<(), AppError> {
        let scope = self
            .tenant_repo
            .find_department_scope(&self.pool, department_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Department))?;

        if !actor.is_super_admin() && actor.scope.company_id != Some(scope.company_id) {
            return Err(AppError::NotFound(Entity::Department));
        }

        authorize(
            actor,
            &Resource::new(
                ResourceKind::Department,
                TenantScope::department(scope.company_id, scope.site_id, scope.department_id),
            ),
            Action::Delete,
        )?;

        self.tenant_repo.delete_department(&self.pool, department_id).await?;
        Ok(())
    }
}
