// src/db/survey_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::db_utils::map_unique_violation;
use crate::common::error::AppError;
use crate::common::json_column::JsonColumn;
use crate::models::survey::{Question, QuestionDraft, Survey, SurveyStatus, SurveyType};

// Linha nova de pesquisa. O status sempre nasce como `draft` (default da tabela).
pub struct NewSurvey<'a> {
    pub company_id: Option<Uuid>,
    pub created_by: Uuid,
    pub template_id: Option<Uuid>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub survey_type: SurveyType,
    pub is_anonymous: bool,
    pub settings: Option<&'a JsonColumn>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
// `None` mantém a coluna; `Some(None)` grava NULL nas anuláveis.
pub struct SurveyChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub is_anonymous: Option<bool>,
    pub settings: Option<Option<&'a JsonColumn>>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

/// Sem estado: cada método recebe o executor (pool ou transação) de quem chama.
#[derive(Clone, Default)]
pub struct SurveyRepository;

impl SurveyRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_survey<'e, E>(&self, executor: E, input: NewSurvey<'_>) -> Result<Survey, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>(
            r#"
            INSERT INTO surveys (
                company_id, created_by, template_id, title, description,
                type, status, is_anonymous, settings, starts_at, ends_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(input.company_id)
        .bind(input.created_by)
        .bind(input.template_id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.survey_type)
        .bind(input.is_anonymous)
        .bind(input.settings)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .fetch_one(executor)
        .await?;

        Ok(survey)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(survey)
    }

    /// Pesquisas visíveis: gerais + da empresa (`all_companies` = super_admin).
    pub async fn list_visible<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        all_companies: bool,
        status: Option<SurveyStatus>,
    ) -> Result<Vec<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let surveys = sqlx::query_as::<_, Survey>(
            r#"
            SELECT * FROM surveys
            WHERE (company_id IS NULL OR company_id = $1 OR $2)
              AND ($3::survey_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(all_companies)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(surveys)
    }

    pub async fn update_survey<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: SurveyChanges<'_>,
    ) -> Result<Option<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>(
            r#"
            UPDATE surveys SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                is_anonymous = COALESCE($5, is_anonymous),
                settings = CASE WHEN $6 THEN $7 ELSE settings END,
                starts_at = CASE WHEN $8 THEN $9 ELSE starts_at END,
                ends_at = CASE WHEN $10 THEN $11 ELSE ends_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.is_anonymous)
        .bind(changes.settings.is_some())
        .bind(changes.settings.flatten())
        .bind(changes.starts_at.is_some())
        .bind(changes.starts_at.flatten())
        .bind(changes.ends_at.is_some())
        .bind(changes.ends_at.flatten())
        .fetch_optional(executor)
        .await?;

        Ok(survey)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: SurveyStatus) -> Result<Option<Survey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let survey = sqlx::query_as::<_, Survey>(
            "UPDATE surveys SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(survey)
    }

    pub async fn delete_survey<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  PERGUNTAS
    // =========================================================================

    pub async fn insert_question<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        draft: &QuestionDraft,
    ) -> Result<Question, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (survey_id, type, content, options, is_required, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(survey_id)
        .bind(draft.question_type)
        .bind(&draft.content)
        .bind(&draft.options)
        .bind(draft.is_required)
        .bind(draft.order_index)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Já existe uma pergunta na posição {}.", draft.order_index))
        })
    }

    pub async fn list_questions<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<Vec<Question>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT * FROM questions
            WHERE survey_id = $1
            ORDER BY order_index ASC, created_at ASC, id ASC
            "#,
        )
        .bind(survey_id)
        .fetch_all(executor)
        .await?;

        Ok(questions)
    }

    pub async fn find_question<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Question>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1 AND survey_id = $2")
            .bind(question_id)
            .bind(survey_id)
            .fetch_optional(executor)
            .await?;

        Ok(question)
    }

    /// Substitui a definição da pergunta (todos os campos do rascunho).
    pub async fn update_question<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        question_id: Uuid,
        draft: &QuestionDraft,
    ) -> Result<Option<Question>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions SET
                type = $3,
                content = $4,
                options = $5,
                is_required = $6,
                order_index = $7,
                updated_at = NOW()
            WHERE id = $1 AND survey_id = $2
            RETURNING *
            "#,
        )
        .bind(question_id)
        .bind(survey_id)
        .bind(draft.question_type)
        .bind(&draft.content)
        .bind(&draft.options)
        .bind(draft.is_required)
        .bind(draft.order_index)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Já existe uma pergunta na posição {}.", draft.order_index))
        })
    }

    pub async fn delete_question<'e, E>(&self, executor: E, survey_id: Uuid, question_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND survey_id = $2")
            .bind(question_id)
            .bind(survey_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Maior `order_index` atual (para anexar uma pergunta no fim).
    pub async fn next_order_index<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE survey_id = $1",
        )
        .bind(survey_id)
        .fetch_one(executor)
        .await?;

        Ok(next)
    }
}
