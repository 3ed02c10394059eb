// src/handlers/public.rs
//
// Rotas sem autenticação usadas pelo link público da pesquisa.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::{
        response::{ResponseDetail, SubmitResponsePayload},
        survey::SurveyDetail,
    },
};

#[utoipa::path(
    get,
    path = "/api/public/surveys/{id}",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses(
        (status = 200, description = "Pesquisa ativa com perguntas", body = SurveyDetail),
        (status = 404, description = "Pesquisa inexistente ou inativa")
    )
)]
pub async fn get_public_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .get_public_survey(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(survey))
}

#[utoipa::path(
    post,
    path = "/api/public/surveys/{id}/responses",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body = SubmitResponsePayload,
    responses(
        (status = 201, description = "Resposta anônima registrada", body = ResponseDetail),
        (status = 403, description = "Pesquisa não aceita respostas anônimas"),
        (status = 409, description = "Pesquisa não está aceitando respostas")
    )
)]
pub async fn submit_anonymous_response(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitResponsePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .response_service
        .submit_response(None, id, payload.answers)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(response)))
}
