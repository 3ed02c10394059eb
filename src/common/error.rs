// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Entidades que podem "não existir" (ou estar fora da visibilidade do usuário).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Company,
    Site,
    Department,
    User,
    Template,
    Survey,
    Question,
    Response,
}

impl Entity {
    fn label(self, lang: &str) -> &'static str {
        match (self, lang) {
            (Entity::Company, "pt") => "Empresa",
            (Entity::Site, "pt") => "Site",
            (Entity::Department, "pt") => "Departamento",
            (Entity::User, "pt") => "Usuário",
            (Entity::Template, "pt") => "Template",
            (Entity::Survey, "pt") => "Pesquisa",
            (Entity::Question, "pt") => "Pergunta",
            (Entity::Response, "pt") => "Resposta",
            (Entity::Company, _) => "Company",
            (Entity::Site, _) => "Site",
            (Entity::Department, _) => "Department",
            (Entity::User, _) => "User",
            (Entity::Template, _) => "Template",
            (Entity::Survey, _) => "Survey",
            (Entity::Question, _) => "Question",
            (Entity::Response, _) => "Response",
        }
    }
}

// Erro da camada de serviço. Cada variante tem um status HTTP bem definido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("{0:?} não encontrado")]
    NotFound(Entity),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("A pesquisa não está aceitando respostas")]
    SurveyNotAcceptingResponses,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O corpo de erro que vai para o cliente.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) | AppError::SurveyNotAcceptingResponses => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de serviço na resposta HTTP, traduzida conforme o `Accept-Language`.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let pt = locale.is("pt");
        let status = self.status();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                let msg = if pt { "Um ou mais campos são inválidos." } else { "One or more fields are invalid." };
                (msg.to_string(), Some(Value::Object(details)))
            }
            AppError::InvalidInput(reason) => (reason.clone(), None),
            AppError::NotFound(entity) => {
                let label = entity.label(&locale.0);
                let msg = if pt { format!("{} não encontrado(a).", label) } else { format!("{} not found.", label) };
                (msg, None)
            }
            AppError::Forbidden(reason) => {
                // O motivo detalhado fica no log; o cliente recebe só a mensagem genérica.
                tracing::debug!(reason = %reason, "acesso negado");
                let msg = if pt {
                    "Você não tem permissão para realizar esta ação."
                } else {
                    "You are not allowed to perform this action."
                };
                (msg.to_string(), None)
            }
            AppError::Conflict(reason) => (reason.clone(), None),
            AppError::SurveyNotAcceptingResponses => {
                let msg = if pt {
                    "Esta pesquisa não está aceitando respostas."
                } else {
                    "This survey is not accepting responses."
                };
                (msg.to_string(), None)
            }
            AppError::InvalidCredentials => {
                let msg = if pt { "E-mail ou senha inválidos." } else { "Invalid email or password." };
                (msg.to_string(), None)
            }
            AppError::InvalidToken => {
                let msg = if pt {
                    "Token de autenticação inválido ou ausente."
                } else {
                    "Invalid or missing authentication token."
                };
                (msg.to_string(), None)
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                let msg = if pt { "Registro não encontrado." } else { "Record not found." };
                (msg.to_string(), None)
            }
            // Todos os outros erros viram 500. O detalhe vai para o log, nunca para o cliente.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let msg = if pt { "Ocorreu um erro inesperado." } else { "An unexpected error occurred." };
                (msg.to_string(), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Rotas que não têm o `Locale` em mãos respondem em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::NotFound(Entity::Survey).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::SurveyNotAcceptingResponses.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_follow_the_locale() {
        let err = AppError::NotFound(Entity::Template);
        assert_eq!(err.to_api_error(&Locale("en".into())).error, "Template not found.");
        assert_eq!(err.to_api_error(&Locale("pt".into())).error, "Template não encontrado(a).");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 1234"));
        let api = err.to_api_error(&Locale::default());
        assert!(!api.error.contains("1234"));
    }
}
