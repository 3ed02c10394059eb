// src/models/template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::{json_column::JsonColumn, patch::nullable};
use crate::models::survey::{QuestionDraft, QuestionPayload, QuestionType, SurveyType};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    // None = template global
    pub company_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    #[schema(example = "Quick NPS")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "Engajamento")]
    pub category: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub template_type: SurveyType,
    pub is_anonymous: bool,
    // Só cresce: +1 por pesquisa criada a partir do template
    pub use_count: i32,
    // Calculado na query: (company_id IS NULL)
    pub is_global: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuestion {
    pub id: Uuid,
    pub template_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    #[schema(value_type = Option<Object>)]
    pub options: Option<JsonColumn>,
    pub is_required: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&TemplateQuestion> for QuestionDraft {
    fn from(q: &TemplateQuestion) -> Self {
        Self {
            question_type: q.question_type,
            content: q.content.clone(),
            options: q.options.clone(),
            is_required: q.is_required,
            order_index: q.order_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: Template,
    pub questions: Vec<TemplateQuestion>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    #[schema(example = "Engajamento")]
    pub category: Option<String>,
    #[schema(example = "nps")]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatePayload {
    #[validate(length(min = 1, message = "O nome do template é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type", default)]
    pub template_type: SurveyType,
    // Só super_admin pode criar template global; para os demais vira `false`
    #[serde(default)]
    pub is_global: bool,
    // Respeitado apenas para super_admin com isGlobal = false
    pub company_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    #[validate(nested)]
    #[serde(default)]
    #[schema(example = json!([{ "type": "nps", "content": "Você nos recomendaria?", "isRequired": true }]))]
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplatePayload {
    #[validate(length(min = 1, message = "O nome do template é obrigatório."))]
    pub name: Option<String>,
    // `null` limpa, ausente mantém
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(rename = "type")]
    pub template_type: Option<SurveyType>,
    pub is_anonymous: Option<bool>,
    // Quando presente, substitui a lista de perguntas inteira (validada no serviço)
    pub questions: Option<Vec<QuestionPayload>>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_defaults() {
        let payload: CreateTemplatePayload = serde_json::from_value(json!({ "name": "Clima" })).unwrap();
        assert_eq!(payload.template_type, SurveyType::Custom);
        assert!(!payload.is_global);
        assert!(payload.is_anonymous);
        assert!(payload.questions.is_empty());
    }

    #[test]
    fn update_can_clear_category() {
        let payload: UpdateTemplatePayload = serde_json::from_value(json!({ "category": null })).unwrap();
        assert_eq!(payload.category, Some(None));
        assert_eq!(payload.description, None);
    }
}
