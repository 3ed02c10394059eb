// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Tenancy ---
        handlers::tenancy::list_companies,
        handlers::tenancy::create_company,
        handlers::tenancy::get_company,
        handlers::tenancy::update_company,
        handlers::tenancy::delete_company,
        handlers::tenancy::list_sites,
        handlers::tenancy::create_site,
        handlers::tenancy::delete_site,
        handlers::tenancy::list_departments,
        handlers::tenancy::create_department,
        handlers::tenancy::delete_department,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::list_categories,
        handlers::templates::create_template,
        handlers::templates::get_template,
        handlers::templates::update_template,
        handlers::templates::delete_template,
        handlers::templates::create_survey_from_template,

        // --- Surveys ---
        handlers::surveys::list_surveys,
        handlers::surveys::create_survey,
        handlers::surveys::get_survey,
        handlers::surveys::update_survey,
        handlers::surveys::delete_survey,
        handlers::surveys::change_status,
        handlers::surveys::duplicate_survey,
        handlers::surveys::add_question,
        handlers::surveys::update_question,
        handlers::surveys::delete_question,
        handlers::surveys::share_link,
        handlers::surveys::qr_code,

        // --- Responses ---
        handlers::responses::list_responses,
        handlers::responses::submit_response,
        handlers::responses::survey_results,
        handlers::responses::get_response,
        handlers::responses::upsert_answer,

        // --- Public ---
        handlers::public::get_public_survey,
        handlers::public::submit_anonymous_response,
    ),
    components(
        schemas(
            // --- Auth / Users ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::user::Role,
            models::user::User,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,

            // --- Tenancy ---
            models::tenancy::Company,
            models::tenancy::Site,
            models::tenancy::Department,
            models::tenancy::CreateCompanyPayload,
            models::tenancy::UpdateCompanyPayload,
            models::tenancy::CreateSitePayload,
            models::tenancy::CreateDepartmentPayload,

            // --- Templates ---
            models::template::Template,
            models::template::TemplateQuestion,
            models::template::TemplateDetail,
            models::template::CreateTemplatePayload,
            models::template::UpdateTemplatePayload,

            // --- Surveys ---
            models::survey::SurveyType,
            models::survey::SurveyStatus,
            models::survey::QuestionType,
            models::survey::Survey,
            models::survey::Question,
            models::survey::SurveyDetail,
            models::survey::QuestionPayload,
            models::survey::CreateSurveyPayload,
            models::survey::UpdateSurveyPayload,
            models::survey::ChangeStatusPayload,
            models::survey::ProvisionOverrides,
            models::survey::ShareLink,

            // --- Responses ---
            models::response::Response,
            models::response::Answer,
            models::response::ResponseDetail,
            models::response::AnswerPayload,
            models::response::SubmitResponsePayload,
            models::response::UpsertAnswerPayload,
            models::response::NpsBreakdown,
            models::response::QuestionResult,
            models::response::SurveyResults,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários e perfil"),
        (name = "Tenancy", description = "Empresas, sites e departamentos"),
        (name = "Templates", description = "Catálogo de templates e provisionamento"),
        (name = "Surveys", description = "Pesquisas, perguntas e compartilhamento"),
        (name = "Responses", description = "Coleta de respostas e resultados"),
        (name = "Public", description = "Link público da pesquisa (sem login)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
