// src/models/response.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::survey::QuestionType;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub respondent_id: Option<Uuid>,
    // Respostas anônimas carregam um token em vez do usuário
    pub anonymous_token: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Uuid,
    pub response_id: Uuid,
    pub question_id: Uuid,
    // Valor livre, devolvido exatamente como foi gravado
    #[schema(value_type = Object)]
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    #[serde(flatten)]
    pub response: Response,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: Uuid,
    #[schema(value_type = Object, example = json!(9))]
    pub value: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponsePayload {
    pub answers: Vec<AnswerPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAnswerPayload {
    #[schema(value_type = Object, example = json!("Ótimo atendimento"))]
    pub value: Value,
}

// --- RESULTADOS ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpsBreakdown {
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    // %promotores - %detratores, com 1 casa decimal
    #[schema(value_type = f64, example = 42.9)]
    pub score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub answer_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps: Option<NpsBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub average: Option<Decimal>,
    // Contagem por opção (choice / yes_no)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tally: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResults {
    pub survey_id: Uuid,
    pub response_count: i64,
    pub completed_count: i64,
    pub questions: Vec<QuestionResult>,
}
