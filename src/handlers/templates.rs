// src/handlers/templates.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        survey::{ProvisionOverrides, SurveyDetail},
        template::{CreateTemplatePayload, Template, TemplateDetail, TemplateFilter, UpdateTemplatePayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    params(
        ("category" = Option<String>, Query, description = "Categoria exata"),
        ("search" = Option<String>, Query, description = "Trecho do nome ou da descrição")
    ),
    responses((status = 200, description = "Templates globais e da empresa", body = Vec<Template>)),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(filter): Query<TemplateFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = app_state
        .template_service
        .list_templates(&user.actor(), filter)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(templates))
}

#[utoipa::path(
    get,
    path = "/api/templates/categories",
    tag = "Templates",
    responses((status = 200, description = "Categorias distintas", body = Vec<String>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .template_service
        .list_categories(&user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = CreateTemplatePayload,
    responses(
        (status = 201, description = "Template criado com as perguntas", body = TemplateDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .template_service
        .create_template(&user.actor(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template com perguntas ordenadas", body = TemplateDetail),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .template_service
        .get_template(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(template))
}

#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    request_body = UpdateTemplatePayload,
    responses(
        (status = 200, description = "Template atualizado", body = TemplateDetail),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .template_service
        .update_template(&user.actor(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(template))
}

#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 204, description = "Template excluído"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .template_service
        .delete_template(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// Provisionamento: nova pesquisa a partir do template
#[utoipa::path(
    post,
    path = "/api/templates/{id}/create-survey",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    request_body = ProvisionOverrides,
    responses(
        (status = 201, description = "Pesquisa criada com as perguntas copiadas", body = SurveyDetail),
        (status = 404, description = "Template não encontrado ou fora da visibilidade"),
        (status = 403, description = "Sem permissão para criar pesquisas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_survey_from_template(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ProvisionOverrides>>,
) -> Result<impl IntoResponse, ApiError> {
    let overrides = payload.map(|Json(p)| p).unwrap_or_default();

    let survey = app_state
        .survey_service
        .create_from_template(&user.actor(), id, overrides)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(survey)))
}
