// src/handlers/responses.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::response::{Answer, Response, ResponseDetail, SubmitResponsePayload, SurveyResults, UpsertAnswerPayload},
};

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/responses",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses(
        (status = 200, description = "Respostas da pesquisa", body = Vec<Response>),
        (status = 403, description = "Apenas administradores da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_responses(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(survey_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let responses = app_state
        .response_service
        .list_responses(&user.actor(), survey_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(responses))
}

#[utoipa::path(
    post,
    path = "/api/surveys/{id}/responses",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body = SubmitResponsePayload,
    responses(
        (status = 201, description = "Resposta registrada", body = ResponseDetail),
        (status = 400, description = "Pergunta inválida ou obrigatória sem resposta"),
        (status = 409, description = "Pesquisa não está aceitando respostas")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_response(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(survey_id): Path<Uuid>,
    Json(payload): Json<SubmitResponsePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = user.actor();
    let response = app_state
        .response_service
        .submit_response(Some(&actor), survey_id, payload.answers)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/results",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses((status = 200, description = "Resultados agregados (NPS, médias, contagens)", body = SurveyResults)),
    security(("api_jwt" = []))
)]
pub async fn survey_results(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(survey_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let results = app_state
        .response_service
        .survey_results(&user.actor(), survey_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/responses/{id}",
    tag = "Responses",
    params(("id" = Uuid, Path, description = "ID da resposta")),
    responses(
        (status = 200, description = "Resposta com as respostas por pergunta", body = ResponseDetail),
        (status = 404, description = "Resposta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_response(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .response_service
        .get_response(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/responses/{id}/answers/{question_id}",
    tag = "Responses",
    params(
        ("id" = Uuid, Path, description = "ID da resposta"),
        ("question_id" = Uuid, Path, description = "ID da pergunta")
    ),
    request_body = UpsertAnswerPayload,
    responses(
        (status = 200, description = "Resposta atual da pergunta", body = Answer),
        (status = 403, description = "Apenas o respondente")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_answer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpsertAnswerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = app_state
        .response_service
        .upsert_answer(&user.actor(), id, question_id, payload.value)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(answer))
}
