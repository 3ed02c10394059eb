// src/db/response_repo.rs

use serde_json::Value;
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::response::{Answer, Response};

#[derive(Debug, Clone, Copy, FromRow)]
pub struct ResponseCounts {
    pub total: i64,
    pub completed: i64,
}

/// Sem estado: cada método recebe o executor (pool ou transação) de quem chama.
#[derive(Clone, Default)]
pub struct ResponseRepository;

impl ResponseRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_response<'e, E>(
        &self,
        executor: E,
        survey_id: Uuid,
        respondent_id: Option<Uuid>,
        anonymous_token: Option<&str>,
    ) -> Result<Response, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let response = sqlx::query_as::<_, Response>(
            r#"
            INSERT INTO responses (survey_id, respondent_id, anonymous_token)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(survey_id)
        .bind(respondent_id)
        .bind(anonymous_token)
        .fetch_one(executor)
        .await?;

        Ok(response)
    }

    pub async fn mark_completed<'e, E>(&self, executor: E, response_id: Uuid) -> Result<Response, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let response = sqlx::query_as::<_, Response>(
            "UPDATE responses SET completed_at = COALESCE(completed_at, NOW()) WHERE id = $1 RETURNING *",
        )
        .bind(response_id)
        .fetch_one(executor)
        .await?;

        Ok(response)
    }

    /// Grava a resposta atual para o par (resposta, pergunta).
    /// Uma segunda escrita para o mesmo par sobrescreve o valor, nunca duplica.
    pub async fn upsert_answer<'e, E>(
        &self,
        executor: E,
        response_id: Uuid,
        question_id: Uuid,
        value: &Value,
    ) -> Result<Answer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (response_id, question_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (response_id, question_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(response_id)
        .bind(question_id)
        .bind(value)
        .fetch_one(executor)
        .await?;

        Ok(answer)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Response>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let response = sqlx::query_as::<_, Response>("SELECT * FROM responses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(response)
    }

    pub async fn list_for_survey<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<Vec<Response>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let responses = sqlx::query_as::<_, Response>(
            "SELECT * FROM responses WHERE survey_id = $1 ORDER BY created_at DESC",
        )
        .bind(survey_id)
        .fetch_all(executor)
        .await?;

        Ok(responses)
    }

    pub async fn list_answers<'e, E>(&self, executor: E, response_id: Uuid) -> Result<Vec<Answer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.* FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.response_id = $1
            ORDER BY q.order_index ASC
            "#,
        )
        .bind(response_id)
        .fetch_all(executor)
        .await?;

        Ok(answers)
    }

    /// Todas as respostas atuais de uma pesquisa (para os resultados agregados).
    pub async fn list_answers_for_survey<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<Vec<Answer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.* FROM answers a
            JOIN responses r ON r.id = a.response_id
            WHERE r.survey_id = $1
            "#,
        )
        .bind(survey_id)
        .fetch_all(executor)
        .await?;

        Ok(answers)
    }

    pub async fn count_for_survey<'e, E>(&self, executor: E, survey_id: Uuid) -> Result<ResponseCounts, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = sqlx::query_as::<_, ResponseCounts>(
            r#"
            SELECT COUNT(*) AS total, COUNT(completed_at) AS completed
            FROM responses
            WHERE survey_id = $1
            "#,
        )
        .bind(survey_id)
        .fetch_one(executor)
        .await?;

        Ok(counts)
    }
}
