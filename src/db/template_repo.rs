// src/db/template_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::db_utils::{escape_like, map_unique_violation};
use crate::common::error::AppError;
use crate::models::survey::{QuestionDraft, SurveyType};
use crate::models::template::{Template, TemplateQuestion};

// `is_global` não é coluna: é calculado em toda leitura
const TEMPLATE_COLUMNS: &str = "id, company_id, created_by, name, description, category, type, \
                                is_anonymous, use_count, (company_id IS NULL) AS is_global, created_at, updated_at";

pub struct NewTemplate<'a> {
    pub company_id: Option<Uuid>,
    pub created_by: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub template_type: SurveyType,
    pub is_anonymous: bool,
}

#[derive(Default)]
// `None` mantém a coluna; `Some(None)` grava NULL nas anuláveis.
pub struct TemplateChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub category: Option<Option<&'a str>>,
    pub template_type: Option<SurveyType>,
    pub is_anonymous: Option<bool>,
}

/// Sem estado: cada método recebe o executor (pool ou transação) de quem chama.
#[derive(Clone, Default)]
pub struct TemplateRepository;

impl TemplateRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_template<'e, E>(&self, executor: E, input: NewTemplate<'_>) -> Result<Template, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO templates (company_id, created_by, name, description, category, type, is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        );

        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(input.company_id)
            .bind(input.created_by)
            .bind(input.name)
            .bind(input.description)
            .bind(input.category)
            .bind(input.template_type)
            .bind(input.is_anonymous)
            .fetch_one(executor)
            .await?;

        Ok(template)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Template>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1");
        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(template)
    }

    /// Lista templates visíveis: globais + da empresa (`all_companies` = super_admin).
    pub async fn list_visible<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        all_companies: bool,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Template>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE (company_id IS NULL OR company_id = $1 OR $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL
                   OR name ILIKE '%' || $4 || '%'
                   OR COALESCE(description, '') ILIKE '%' || $4 || '%')
            ORDER BY (company_id IS NULL) DESC, name ASC, created_at ASC
            "#
        );

        let templates = sqlx::query_as::<_, Template>(&sql)
            .bind(company_id)
            .bind(all_companies)
            .bind(category)
            .bind(search.map(escape_like))
            .fetch_all(executor)
            .await?;

        Ok(templates)
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        all_companies: bool,
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM templates
            WHERE category IS NOT NULL
              AND (company_id IS NULL OR company_id = $1 OR $2)
            ORDER BY category ASC
            "#,
        )
        .bind(company_id)
        .bind(all_companies)
        .fetch_all(executor)
        .await?;

        Ok(categories)
    }

    pub async fn update_template<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: TemplateChanges<'_>,
    ) -> Result<Option<Template>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE templates SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                category = CASE WHEN $5 THEN $6 ELSE category END,
                type = COALESCE($7, type),
                is_anonymous = COALESCE($8, is_anonymous),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        );

        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.description.is_some())
            .bind(changes.description.flatten())
            .bind(changes.category.is_some())
            .bind(changes.category.flatten())
            .bind(changes.template_type)
            .bind(changes.is_anonymous)
            .fetch_optional(executor)
            .await?;

        Ok(template)
    }

    /// Incremento atômico na própria linha; nunca ler-modificar-gravar na aplicação.
    /// Retorna o novo valor, ou `None` se o template não existe mais.
    pub async fn increment_use_count<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE templates
            SET use_count = use_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING use_count
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(count)
    }

    pub async fn delete_template<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  PERGUNTAS DO TEMPLATE
    // =========================================================================

    pub async fn insert_question<'e, E>(
        &self,
        executor: E,
        template_id: Uuid,
        draft: &QuestionDraft,
    ) -> Result<TemplateQuestion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // `options` vai como JSONB via JsonColumn: uma única serialização
        sqlx::query_as::<_, TemplateQuestion>(
            r#"
            INSERT INTO template_questions (template_id, type, content, options, is_required, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(template_id)
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

    /// Perguntas em ordem de exibição; empates (não esperados) seguem a ordem de inserção.
    pub async fn list_questions<'e, E>(&self, executor: E, template_id: Uuid) -> Result<Vec<TemplateQuestion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let questions = sqlx::query_as::<_, TemplateQuestion>(
            r#"
            SELECT * FROM template_questions
            WHERE template_id = $1
            ORDER BY order_index ASC, created_at ASC, id ASC
            "#,
        )
        .bind(template_id)
        .fetch_all(executor)
        .await?;

        Ok(questions)
    }

    pub async fn delete_questions<'e, E>(&self, executor: E, template_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM template_questions WHERE template_id = $1")
            .bind(template_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
