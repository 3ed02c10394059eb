// src/handlers/surveys.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::survey::{
        ChangeStatusPayload, CreateSurveyPayload, ProvisionOverrides, Question, QuestionPayload, ShareLink, Survey,
        SurveyDetail, SurveyListQuery, UpdateSurveyPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/surveys",
    tag = "Surveys",
    params(("status" = Option<String>, Query, description = "draft | active | closed")),
    responses((status = 200, description = "Pesquisas visíveis, mais recentes primeiro", body = Vec<Survey>)),
    security(("api_jwt" = []))
)]
pub async fn list_surveys(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<SurveyListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let surveys = app_state
        .survey_service
        .list_surveys(&user.actor(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(surveys))
}

#[utoipa::path(
    post,
    path = "/api/surveys",
    tag = "Surveys",
    request_body = CreateSurveyPayload,
    responses(
        (status = 201, description = "Pesquisa criada (draft)", body = SurveyDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSurveyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .create_blank(&user.actor(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(survey)))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses(
        (status = 200, description = "Pesquisa com perguntas", body = SurveyDetail),
        (status = 404, description = "Pesquisa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .get_survey(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(survey))
}

#[utoipa::path(
    put,
    path = "/api/surveys/{id}",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body = UpdateSurveyPayload,
    responses((status = 200, description = "Pesquisa atualizada", body = Survey)),
    security(("api_jwt" = []))
)]
pub async fn update_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSurveyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .update_survey(&user.actor(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(survey))
}

#[utoipa::path(
    delete,
    path = "/api/surveys/{id}",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses((status = 204, description = "Pesquisa excluída com perguntas e respostas")),
    security(("api_jwt" = []))
)]
pub async fn delete_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .survey_service
        .delete_survey(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/surveys/{id}/status",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body = ChangeStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Survey),
        (status = 400, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .change_status(&user.actor(), id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(survey))
}

#[utoipa::path(
    post,
    path = "/api/surveys/{id}/duplicate",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa de origem")),
    request_body = ProvisionOverrides,
    responses((status = 201, description = "Cópia criada (draft)", body = SurveyDetail)),
    security(("api_jwt" = []))
)]
pub async fn duplicate_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ProvisionOverrides>>,
) -> Result<impl IntoResponse, ApiError> {
    let overrides = payload.map(|Json(p)| p).unwrap_or_default();

    let survey = app_state
        .survey_service
        .duplicate_survey(&user.actor(), id, overrides)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(survey)))
}

// ---
// Perguntas
// ---

#[utoipa::path(
    post,
    path = "/api/surveys/{id}/questions",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body = QuestionPayload,
    responses(
        (status = 201, description = "Pergunta adicionada", body = Question),
        (status = 409, description = "orderIndex já ocupado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_question(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let question = app_state
        .survey_service
        .add_question(&user.actor(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    put,
    path = "/api/surveys/{id}/questions/{question_id}",
    tag = "Surveys",
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("question_id" = Uuid, Path, description = "ID da pergunta")
    ),
    request_body = QuestionPayload,
    responses((status = 200, description = "Pergunta atualizada", body = Question)),
    security(("api_jwt" = []))
)]
pub async fn update_question(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let question = app_state
        .survey_service
        .update_question(&user.actor(), id, question_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(question))
}

#[utoipa::path(
    delete,
    path = "/api/surveys/{id}/questions/{question_id}",
    tag = "Surveys",
    params(
        ("id" = Uuid, Path, description = "ID da pesquisa"),
        ("question_id" = Uuid, Path, description = "ID da pergunta")
    ),
    responses((status = 204, description = "Pergunta removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_question(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .survey_service
        .delete_question(&user.actor(), id, question_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Compartilhamento
// ---

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/share",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses((status = 200, description = "Link público da pesquisa", body = ShareLink)),
    security(("api_jwt" = []))
)]
pub async fn share_link(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let link = app_state
        .share_service
        .share_link(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(link))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/qr",
    tag = "Surveys",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses((status = 200, description = "QR Code do link público", content_type = "image/png")),
    security(("api_jwt" = []))
)]
pub async fn qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let png = app_state
        .share_service
        .qr_code(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
