// src/handlers/tenancy.rs

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
    models::tenancy::{
        Company, CreateCompanyPayload, CreateDepartmentPayload, CreateSitePayload, Department, Site,
        UpdateCompanyPayload,
    },
};

// ---
// Empresas
// ---

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Tenancy",
    responses((status = 200, description = "Empresas visíveis", body = Vec<Company>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .tenant_service
        .list_companies(&user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(companies))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Tenancy",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 403, description = "Apenas super_admin"),
        (status = 409, description = "Slug já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .tenant_service
        .create_company(&user.actor(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .tenant_service
        .get_company(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    request_body = UpdateCompanyPayload,
    responses((status = 200, description = "Empresa atualizada", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .tenant_service
        .update_company(&user.actor(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 204, description = "Empresa excluída (em cascata)"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .delete_company(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Sites
// ---

#[utoipa::path(
    get,
    path = "/api/companies/{id}/sites",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Sites da empresa", body = Vec<Site>)),
    security(("api_jwt" = []))
)]
pub async fn list_sites(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(company_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sites = app_state
        .tenant_service
        .list_sites(&user.actor(), company_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(sites))
}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/sites",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateSitePayload,
    responses((status = 201, description = "Site criado", body = Site)),
    security(("api_jwt" = []))
)]
pub async fn create_site(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateSitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let site = app_state
        .tenant_service
        .create_site(&user.actor(), company_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(site)))
}

#[utoipa::path(
    delete,
    path = "/api/sites/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID do site")),
    responses(
        (status = 204, description = "Site excluído"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_site(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .delete_site(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Departamentos
// ---

#[utoipa::path(
    get,
    path = "/api/sites/{id}/departments",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID do site")),
    responses((status = 200, description = "Departamentos do site", body = Vec<Department>)),
    security(("api_jwt" = []))
)]
pub async fn list_departments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(site_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let departments = app_state
        .tenant_service
        .list_departments(&user.actor(), site_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(departments))
}

#[utoipa::path(
    post,
    path = "/api/sites/{id}/departments",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID do site")),
    request_body = CreateDepartmentPayload,
    responses((status = 201, description = "Departamento criado", body = Department)),
    security(("api_jwt" = []))
)]
pub async fn create_department(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<CreateDepartmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let department = app_state
        .tenant_service
        .create_department(&user.actor(), site_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "Tenancy",
    params(("id" = Uuid, Path, description = "ID do departamento")),
    responses((status = 204, description = "Departamento excluído")),
    security(("api_jwt" = []))
)]
pub async fn delete_department(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .delete_department(&user.actor(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
