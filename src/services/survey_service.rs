// src/services/survey_service.rs
//
// Provisionamento de pesquisas: a partir de template, em branco ou por duplicação.
// Toda criação grava pesquisa + perguntas (+ useCount) numa única transação.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, Entity},
    db::{
        survey_repo::{NewSurvey, SurveyChanges},
        SurveyRepository, TemplateRepository,
    },
    models::survey::{
        drafts_from_payload, CreateSurveyPayload, ProvisionOverrides, Question, QuestionDraft, QuestionPayload, Survey,
        SurveyDetail, SurveyStatus, UpdateSurveyPayload,
    },
    services::{
        access_policy::{authorize, decide, ensure_visible, Action, Actor, Resource, ResourceKind, TenantScope},
        template_service::template_resource,
    },
};

pub(crate) fn survey_resource(survey: &Survey) -> Resource {
    Resource::new(ResourceKind::Survey, TenantScope::company(survey.company_id))
        .owned_by(Some(survey.created_by))
        .live(survey.status == SurveyStatus::Active)
}

/// Título padrão ao criar a partir de um template: `"<nome> - <AAAA-MM-DD>"`.
pub fn title_from_template(template_name: &str, today: NaiveDate) -> String {
    format!("{} - {}", template_name, today.format("%Y-%m-%d"))
}

pub fn duplicate_title(title: &str) -> String {
    format!("{} (Copy)", title)
}

/// Empresa da nova pesquisa. Só o super_admin escolhe (inclusive `None` = geral);
/// os demais criam sempre na própria empresa.
pub fn resolve_survey_company(actor: &Actor, requested: Option<Uuid>) -> Option<Uuid> {
    if actor.is_super_admin() { requested } else { actor.scope.company_id }
}

#[derive(Clone)]
pub struct SurveyService {
    survey_repo: SurveyRepository,
    template_repo: TemplateRepository,
    pool: PgPool,
}

impl SurveyService {
    pub fn new(survey_repo: SurveyRepository, template_repo: TemplateRepository, pool: PgPool) -> Self {
        Self { survey_repo, template_repo, pool }
    }

    // =========================================================================
    //  PROVISIONAMENTO
    // =========================================================================

    pub async fn create_from_template(
        &self,
        actor: &Actor,
        template_id: Uuid,
        overrides: ProvisionOverrides,
    ) -> Result<SurveyDetail, AppError> {
        overrides.validate()?;

        // 1. Template precisa existir e estar visível
        let template = self
            .template_repo
            .find_by_id(&self.pool, template_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Template))?;
        ensure_visible(actor, &template_resource(&template), Entity::Template)?;

        // 2. Perguntas na ordem de exibição
        let source: Vec<QuestionDraft> = self
            .template_repo
            .list_questions(&self.pool, template.id)
            .await?
            .iter()
            .map(QuestionDraft::from)
            .collect();

        let company_id = resolve_survey_company(actor, overrides.company_id);
        authorize(actor, &Resource::new(ResourceKind::Survey, TenantScope::company(company_id)), Action::Create)?;

        let title = overrides
            .title
            .unwrap_or_else(|| title_from_template(&template.name, Utc::now().date_naive()));

        // 3-5. Pesquisa, cópia das perguntas e useCount: tudo ou nada
        let mut tx = self.pool.begin().await?;

        let survey = self
            .survey_repo
            .create_survey(
                &mut *tx,
                NewSurvey {
                    company_id,
                    created_by: actor.user_id,
                    template_id: Some(template.id),
                    title: &title,
                    description: template.description.as_deref(),
                    survey_type: template.template_type,
                    is_anonymous: template.is_anonymous,
                    settings: None,
                    starts_at: None,
                    ends_at: None,
                },
            )
            .await?;

        let questions = self.copy_questions(&mut tx, survey.id, &source).await?;

        // Template removido no meio do caminho: o `?` descarta a transação
        let use_count = self
            .template_repo
            .increment_use_count(&mut *tx, template.id)
            .await?
            .ok_or(AppError::NotFound(Entity::Template))?;

        tx.commit().await?;

        tracing::info!(
            survey_id = %survey.id,
            template_id = %template.id,
            questions = questions.len(),
            use_count,
            "pesquisa criada a partir de template"
        );

        Ok(SurveyDetail { survey, questions })
    }

    pub async fn create_blank(&self, actor: &Actor, payload: CreateSurveyPayload) -> Result<SurveyDetail, AppError> {
        payload.validate()?;

        let company_id = resolve_survey_company(actor, payload.company_id);
        authorize(actor, &Resource::new(ResourceKind::Survey, TenantScope::company(company_id)), Action::Create)?;

        let drafts = drafts_from_payload(payload.questions);

        let mut tx = self.pool.begin().await?;

        let survey = self
            .survey_repo
            .create_survey(
                &mut *tx,
                NewSurvey {
                    company_id,
                    created_by: actor.user_id,
                    template_id: None,
                    title: payload.title.trim(),
                    description: payload.description.as_deref(),
                    survey_type: payload.survey_type,
                    is_anonymous: payload.is_anonymous.unwrap_or(true),
                    settings: payload.settings.as_ref(),
                    starts_at: payload.starts_at,
                    ends_at: payload.ends_at,
                },
            )
            .await?;

        let questions = self.copy_questions(&mut tx, survey.id, &drafts).await?;

        tx.commit().await?;

        tracing::info!(survey_id = %survey.id, questions = questions.len(), "pesquisa criada");
        Ok(SurveyDetail { survey, questions })
    }

    /// Cópia de uma pesquisa existente. Não mexe em nenhum useCount.
    pub async fn duplicate_survey(
        &self,
        actor: &Actor,
        survey_id: Uuid,
        overrides: ProvisionOverrides,
    ) -> Result<SurveyDetail, AppError> {
        overrides.validate()?;

        let original = self.load_visible(actor, survey_id).await?;
        let source: Vec<QuestionDraft> = self
            .survey_repo
            .list_questions(&self.pool, original.id)
            .await?
            .iter()
            .map(QuestionDraft::from)
            .collect();

        let company_id = resolve_survey_company(actor, overrides.company_id);
        authorize(actor, &Resource::new(ResourceKind::Survey, TenantScope::company(company_id)), Action::Create)?;

        let title = overrides.title.unwrap_or_else(|| duplicate_title(&original.title));

        let mut tx = self.pool.begin().await?;

        let survey = self
            .survey_repo
            .create_survey(
                &mut *tx,
                NewSurvey {
                    company_id,
                    created_by: actor.user_id,
                    template_id: original.template_id,
                    title: &title,
                    description: original.description.as_deref(),
                    survey_type: original.survey_type,
                    is_anonymous: original.is_anonymous,
                    settings: original.settings.as_ref(),
                    starts_at: None,
                    ends_at: None,
                },
            )
            .await?;

        let questions = self.copy_questions(&mut tx, survey.id, &source).await?;

        tx.commit().await?;

        tracing::info!(survey_id = %survey.id, source_id = %original.id, "pesquisa duplicada");
        Ok(SurveyDetail { survey, questions })
    }

    // Insere as perguntas na ordem recebida, preservando o orderIndex
    async fn copy_questions(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        survey_id: Uuid,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, AppError> {
        let mut questions = Vec::with_capacity(drafts.len());
        for draft in drafts {
            questions.push(self.survey_repo.insert_question(&mut **tx, survey_id, draft).await?);
        }
        Ok(questions)
    }

    // =========================================================================
    //  CONSULTA E MANUTENÇÃO
    // =========================================================================

    /// O SQL recorta por empresa; a política decide o resto (ex.: rascunhos).
    pub async fn list_surveys(&self, actor: &Actor, status: Option<SurveyStatus>) -> Result<Vec<Survey>, AppError> {
        let surveys = self
            .survey_repo
            .list_visible(&self.pool, actor.scope.company_id, actor.is_super_admin(), status)
            .await?;

        Ok(surveys
            .into_iter()
            .filter(|s| decide(actor, &survey_resource(s), Action::Read).is_allowed())
            .collect())
    }

    pub async fn load_visible(&self, actor: &Actor, id: Uuid) -> Result<Survey, AppError> {
        let survey = self
            .survey_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Entity::Survey))?;

        ensure_visible(actor, &survey_resource(&survey), Entity::Survey)?;
        Ok(survey)
    }

    pub async fn get_survey(&self, actor: &Actor, id: Uuid) -> Result<SurveyDetail, AppError> {
        let survey = self.load_visible(actor, id).await?;
        let questions = self.survey_repo.list_questions(&self.pool, survey.id).await?;
        Ok(SurveyDetail { survey, questions })
    }

    /// Versão pública (sem login): só pesquisas ativas.
    pub async fn get_public_survey(&self, id: Uuid) -> Result<SurveyDetail, AppError> {
        let survey = self
            .survey_repo
            .find_by_id(&self.pool, id)
            .await?
            .filter(|s| s.status == SurveyStatus::Active)
            .ok_or(AppError::NotFound(Entity::Survey))?;

        let questions = self.survey_repo.list_questions(&self.pool, survey.id).await?;
        Ok(SurveyDetail { survey, questions })
    }

    pub async fn update_survey(&self, actor: &Actor, id: Uuid, payload: UpdateSurveyPayload) -> Result<Survey, AppError> {
        payload.validate()?;
        let current = self.load_visible(actor, id).await?;
        authorize(actor, &survey_resource(&current), Action::Update)?;

        self.survey_repo
            .update_survey(
                &self.pool,
                id,
                SurveyChanges {
                    title: payload.title.as_deref().map(str::trim),
                    description: payload.description.as_ref().map(|d| d.as_deref()),
                    is_anonymous: payload.is_anonymous,
                    settings: payload.settings.as_ref().map(Option::as_ref),
                    starts_at: payload.starts_at,
                    ends_at: payload.ends_at,
                },
            )
            .await?
            .ok_or(AppError::NotFound(Entity::Survey))
    }

    pub async fn change_status(&self, actor: &Actor, id: Uuid, status: SurveyStatus) -> Result<Survey, AppError> {
        let current = self.load_visible(actor, id).await?;
        authorize(actor, &survey_resource(&current), Action::Update)?;

        if !current.status.can_transition_to(status) {
            return Err(AppError::InvalidInput(format!(
                "Transição de status inválida: {:?} -> {:?}.",
                current.status, status
            )));
        }

        let survey = self
            .survey_repo
            .set_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound(Entity::Survey))?;

        tracing::info!(survey_id = %id, from = ?current.status, to = ?status, "status da pesquisa alterado");
        Ok(survey)
    }

    pub async fn delete_survey(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let survey = self.load_visible(actor, id).await?;
        authorize(actor, &survey_resource(&survey), Action::Delete)?;

        if !self.survey_repo.delete_survey(&self.pool, id).await? {
            return Err(AppError::NotFound(Entity::Survey));
        }

        tracing::info!(survey_id = %id, by = %actor.user_id, "pesquisa excluída");
        Ok(())
    }

    // =========================================================================
    //  PERGUNTAS
    // =========================================================================

    pub async fn add_question(&self, actor: &Actor, survey_id: Uuid, payload: QuestionPayload) -> Result<Question, AppError> {
        payload.validate()?;
        let survey = self.load_visible(actor, survey_id).await?;
        authorize(actor, &survey_resource(&survey), Action::Update)?;

        // Sem orderIndex explícito, vai para o fim
        let position = match payload.order_index {
            Some(index) => index,
            None => self.survey_repo.next_order_index(&self.pool, survey.id).await?,
        };
        let draft = payload.into_draft(position as usize);

        self.survey_repo.insert_question(&self.pool, survey.id, &draft).await
    }

    pub async fn update_question(
        &self,
        actor: &Actor,
        survey_id: Uuid,
        question_id: Uuid,
        payload: QuestionPayload,
    ) -> Result<Question, AppError> {
        payload.validate()?;
        let survey = self.load_visible(actor, survey_id).await?;
        authorize(actor, &survey_resource(&survey), Action::Update)?;

        let existing = self
            .survey_repo
            .find_question(&self.pool, survey.id, question_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Question))?;
        let draft = payload.into_draft(existing.order_index as usize);

        self.survey_repo
            .update_question(&self.pool, survey.id, question_id, &draft)
            .await?
            .ok_or(AppError::NotFound(Entity::Question))
    }

    pub async fn delete_question(&self, actor: &Actor, survey_id: Uuid, question_id: Uuid) -> Result<(), AppError> {
        let survey = self.load_visible(actor, survey_id).await?;
        authorize(actor, &survey_resource(&survey), Action::Update)?;

        if !self.survey_repo.delete_question(&self.pool, survey.id, question_id).await? {
            return Err(AppError::NotFound(Entity::Question));
        }
        Ok(())
    }
}
