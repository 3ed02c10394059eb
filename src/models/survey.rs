// src/models/survey.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::{json_column::JsonColumn, patch::nullable};

// --- ENUMS ---

// Tipo da pesquisa/template (CREATE TYPE survey_type)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "survey_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    Nps,
    #[default]
    Custom,
}

// Ciclo de vida: draft -> active -> closed (closed pode ser reaberta)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "survey_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

impl SurveyStatus {
    pub fn can_transition_to(self, next: SurveyStatus) -> bool {
        matches!(
            (self, next),
            (SurveyStatus::Draft, SurveyStatus::Active)
                | (SurveyStatus::Draft, SurveyStatus::Closed)
                | (SurveyStatus::Active, SurveyStatus::Closed)
                | (SurveyStatus::Closed, SurveyStatus::Active)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Textarea,
    SingleChoice,
    MultipleChoice,
    Rating,
    Scale,
    Nps,
    YesNo,
    Date,
}

// --- PESQUISA ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    // None = pesquisa "geral", visível para todas as empresas
    pub company_id: Option<Uuid>,
    pub created_by: Uuid,
    pub template_id: Option<Uuid>,
    #[schema(example = "Q1 Check-in")]
    pub title: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub status: SurveyStatus,
    pub is_anonymous: bool,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<JsonColumn>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub survey_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[schema(example = "De 0 a 10, o quanto você recomendaria a empresa?")]
    pub content: String,
    // Sempre um valor estruturado (objeto/array), nunca string serializada
    #[schema(value_type = Option<Object>)]
    pub options: Option<JsonColumn>,
    pub is_required: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resposta completa (Pesquisa + Perguntas ordenadas)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub questions: Vec<Question>,
}

// Definição de pergunta independente de onde ela será gravada
// (template_questions ou questions).
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub question_type: QuestionType,
    pub content: String,
    pub options: Option<JsonColumn>,
    pub is_required: bool,
    pub order_index: i32,
}

impl From<&Question> for QuestionDraft {
    fn from(q: &Question) -> Self {
        Self {
            question_type: q.question_type,
            content: q.content.clone(),
            options: q.options.clone(),
            is_required: q.is_required,
            order_index: q.order_index,
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[validate(length(min = 1, message = "O conteúdo da pergunta é obrigatório."))]
    pub content: String,

    #[schema(value_type = Option<Object>, example = json!({ "choices": ["Sim", "Não"] }))]
    pub options: Option<JsonColumn>,

    #[serde(default)]
    pub is_required: bool,

    // Se ausente, usa a posição na lista
    pub order_index: Option<i32>,
}

impl QuestionPayload {
    pub fn into_draft(self, position: usize) -> QuestionDraft {
        QuestionDraft {
            question_type: self.question_type,
            content: self.content,
            options: self.options,
            is_required: self.is_required,
            order_index: self.order_index.unwrap_or(position as i32),
        }
    }
}

/// Converte a lista de perguntas do payload em rascunhos, com `orderIndex` padrão = posição.
pub fn drafts_from_payload(questions: Vec<QuestionPayload>) -> Vec<QuestionDraft> {
    questions
        .into_iter()
        .enumerate()
        .map(|(position, q)| q.into_draft(position))
        .collect()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyPayload {
    #[validate(length(min = 1, message = "O título da pesquisa é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub survey_type: SurveyType,
    // Só respeitado para super_admin (None = pesquisa geral)
    pub company_id: Option<Uuid>,
    pub is_anonymous: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<JsonColumn>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSurveyPayload {
    #[validate(length(min = 1, message = "O título da pesquisa é obrigatório."))]
    pub title: Option<String>,
    // Anuláveis: `null` limpa o campo, ausente mantém
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_anonymous: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Object>)]
    pub settings: Option<Option<JsonColumn>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusPayload {
    pub status: SurveyStatus,
}

// Overrides aceitos ao criar a partir de template ou duplicar
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionOverrides {
    #[validate(length(min = 1, message = "O título da pesquisa não pode ser vazio."))]
    #[schema(example = "Q1 Check-in")]
    pub title: Option<String>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SurveyListQuery {
    pub status: Option<SurveyStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub survey_id: Uuid,
    pub title: String,
    #[schema(example = "https://app.qualitivate.com/s/550e8400-e29b-41d4-a716-446655440000")]
    pub url: String,
}
