// src/services/template_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, Entity},
    db::{
        template_repo::{NewTemplate, TemplateChanges},
        TemplateRepository,
    },
    models::{
        survey::drafts_from_payload,
        template::{CreateTemplatePayload, Template, TemplateDetail, TemplateFilter, UpdateTemplatePayload},
    },
    services::access_policy::{authorize, decide, ensure_visible, Action, Actor, Resource, ResourceKind, TenantScope},
};

pub(crate) fn template_resource(template: &Template) -> Resource {
    Resource::new(ResourceKind::Template, TenantScope::company(template.company_id)).owned_by(template.created_by)
}

/// Empresa dona de um template novo (`None` = global).
/// Para quem não é super_admin, `isGlobal` é ignorado e o template fica na empresa do ator.
pub fn resolve_template_company(
    actor: &Actor,
    is_global: bool,
    requested: Option<Uuid>,
) -> Result<Option<Uuid>, AppError> {
    if actor.is_super_admin() {
        if is_global {
            return Ok(None);
        }
        return requested
            .or(actor.scope.company_id)
            .map(Some)
            .ok_or_else(|| AppError::InvalidInput("Informe a empresa do template ou marque-o como global.".into()));
    }

    if is_global {
        tracing::debug!(user_id = %actor.user_id, "isGlobal ignorado para usuário que não é super_admin");
    }

    Ok(actor.scope.company_id)
}

#[derive(Clone)]
pub struct TemplateService {
    template_repo: TemplateRepository,
    pool: PgPool,
}

impl TemplateService {
    pub fn new(template_repo: TemplateRepository, pool: PgPool) -> Self {
        Self { template_repo, pool }
    }

    pub async fn list_templates(&self, actor: &Actor, filter: TemplateFilter) -> Result<Vec<Template>, AppError> {
        let category = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let templates = self
            .template_repo
            .list_visible(&self.pool, actor.scope.company_id, actor.is_super_admin(), category, search)
            .await?;

        Ok(templates
            .into_iter()
            .filter(|t| decide(actor, &template_resource(t), Action::Read).is_allowed())
            .collect())
    }

    pub async fn list_categories(&self, actor: &Actor) -> Result<Vec<String>, AppError> {
        let own = Resource::new(ResourceKind::Template, TenantScope::company(actor.scope.company_id));
        if !decide(actor, &own, Action::Read).is_allowed() {
            return Ok(Vec::new());
        }

        self.template_repo
            .list_categories(&self.pool, actor.scope.company_id, actor.is_super_admin())
            .await
    }

    /// Template visível para o ator; fora da visibilidade é `NotFound`.
    pub async fn load_visible(&self, actor: &Actor, id: Uuid) -> Result<Template, AppError> {
        let template = self
            .template_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Template))?;

        ensure_visible(actor, &template_resource(&template), Entity::Template)?;
        Ok(template)
    }

    pub async fn get_template(&self, actor: &Actor, id: Uuid) -> Result<TemplateDetail, AppError> {
        let template = self.load_visible(actor, id).await?;
        let questions = self.template_repo.list_questions(&self.pool, template.id).await?;
        Ok(TemplateDetail { template, questions })
    }

    pub async fn create_template(&self, actor: &Actor, payload: CreateTemplatePayload) -> Result<TemplateDetail, AppError> {
        payload.validate()?;

        let company_id = resolve_template_company(actor, payload.is_global, payload.company_id)?;
        authorize(actor, &Resource::new(ResourceKind::Template, TenantScope::company(company_id)), Action::Create)?;

        let drafts = drafts_from_payload(payload.questions);

        let mut tx = self.pool.begin().await?;

        let template = self
            .template_repo
            .create_template(
                &mut *tx,
                NewTemplate {
                    company_id,
                    created_by: actor.user_id,
                    name: payload.name.trim(),
                    description: payload.description.as_deref(),
                    category: payload.category.as_deref(),
                    template_type: payload.template_type,
                    is_anonymous: payload.is_anonymous,
                },
            )
            .await?;

        let mut questions = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            questions.push(self.template_repo.insert_question(&mut *tx, template.id, draft).await?);
        }

        tx.commit().await?;

        tracing::info!(template_id = %template.id, global = template.is_global, questions = questions.len(), "template criado");
        Ok(TemplateDetail { template, questions })
    }

    pub async fn update_template(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateTemplatePayload,
    ) -> Result<TemplateDetail, AppError> {
        payload.validate()?;
        if let Some(questions) = &payload.questions {
            for question in questions {
                question.validate()?;
            }
        }

        let current = self.load_visible(actor, id).await?;
        authorize(actor, &template_resource(&current), Action::Update)?;

        let mut tx = self.pool.begin().await?;

        let template = self
            .template_repo
            .update_template(
                &mut *tx,
                id,
                TemplateChanges {
                    name: payload.name.as_deref().map(str::trim),
                    description: payload.description.as_ref().map(|d| d.as_deref()),
                    category: payload.category.as_ref().map(|c| c.as_deref()),
                    template_type: payload.template_type,
                    is_anonymous: payload.is_anonymous,
                },
            )
            .await?
            .ok_or(AppError::NotFound(Entity::Template))?;

        // Lista de perguntas presente = substituição completa
        if let Some(questions) = payload.questions {
            self.template_repo.delete_questions(&mut *tx, id).await?;
            for draft in &drafts_from_payload(questions) {
                self.template_repo.insert_question(&mut *tx, id, draft).await?;
            }
        }

        let questions = self.template_repo.list_questions(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(TemplateDetail { template, questions })
    }

    pub async fn delete_template(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let template = self.load_visible(actor, id).await?;
        authorize(actor, &template_resource(&template), Action::Delete)?;

        if !self.template_repo.delete_template(&self.pool, id).await? {
            return Err(AppError::NotFound(Entity::Template));
        }

        tracing::info!(template_id = %id, by = %actor.user_id, "template excluído");
        Ok(())
    }
}
