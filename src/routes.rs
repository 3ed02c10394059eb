// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo da API.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas (sem token)
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/public/surveys/{id}", get(handlers::public::get_public_survey))
        .route(
            "/api/public/surveys/{id}/responses",
            post(handlers::public::submit_anonymous_response),
        );

    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let tenancy_routes = Router::new()
        .route(
            "/api/companies",
            get(handlers::tenancy::list_companies).post(handlers::tenancy::create_company),
        )
        .route(
            "/api/companies/{id}",
            get(handlers::tenancy::get_company)
                .put(handlers::tenancy::update_company)
                .delete(handlers::tenancy::delete_company),
        )
        .route(
            "/api/companies/{id}/sites",
            get(handlers::tenancy::list_sites).post(handlers::tenancy::create_site),
        )
        .route("/api/sites/{id}", delete(handlers::tenancy::delete_site))
        .route(
            "/api/sites/{id}/departments",
            get(handlers::tenancy::list_departments).post(handlers::tenancy::create_department),
        )
        .route(
            "/api/departments/{id}",
            delete(handlers::tenancy::delete_department),
        );

    let template_routes = Router::new()
        .route(
            "/api/templates",
            get(handlers::templates::list_templates).post(handlers::templates::create_template),
        )
        .route("/api/templates/categories", get(handlers::templates::list_categories))
        .route(
            "/api/templates/{id}",
            get(handlers::templates::get_template)
                .put(handlers::templates::update_template)
                .delete(handlers::templates::delete_template),
        )
        .route(
            "/api/templates/{id}/create-survey",
            post(handlers::templates::create_survey_from_template),
        );

    let survey_routes = Router::new()
        .route(
            "/api/surveys",
            get(handlers::surveys::list_surveys).post(handlers::surveys::create_survey),
        )
        .route(
            "/api/surveys/{id}",
            get(handlers::surveys::get_survey)
                .put(handlers::surveys::update_survey)
                .delete(handlers::surveys::delete_survey),
        )
        .route("/api/surveys/{id}/status", put(handlers::surveys::change_status))
        .route("/api/surveys/{id}/duplicate", post(handlers::surveys::duplicate_survey))
        .route("/api/surveys/{id}/questions", post(handlers::surveys::add_question))
        .route(
            "/api/surveys/{id}/questions/{question_id}",
            put(handlers::surveys::update_question).delete(handlers::surveys::delete_question),
        )
        .route("/api/surveys/{id}/share", get(handlers::surveys::share_link))
        .route("/api/surveys/{id}/qr", get(handlers::surveys::qr_code))
        .route(
            "/api/surveys/{id}/responses",
            get(handlers::responses::list_responses).post(handlers::responses::submit_response),
        )
        .route("/api/surveys/{id}/results", get(handlers::responses::survey_results))
        .route("/api/responses/{id}", get(handlers::responses::get_response))
        .route(
            "/api/responses/{id}/answers/{question_id}",
            put(handlers::responses::upsert_answer),
        );

    // Tudo abaixo exige um Bearer token válido
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(tenancy_routes)
        .merge(template_routes)
        .merge(survey_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
