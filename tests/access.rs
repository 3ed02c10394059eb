// tests/access.rs
//
// Visibilidade entre empresas e hierarquia de papéis contra um Postgres real.

mod common;

use sqlx::PgPool;

use serde_json::json;

use qualitivate::{
    common::error::AppError,
    models::{
        response::AnswerPayload,
        survey::{CreateSurveyPayload, QuestionType, SurveyStatus, SurveyType},
        template::{CreateTemplatePayload, TemplateFilter},
        user::{CreateUserPayload, Role, UpdateUserPayload},
    },
    services::access_policy::TenantScope,
};

fn template_payload(name: &str, is_global: bool) -> CreateTemplatePayload {
    CreateTemplatePayload {
        name: name.to_string(),
        description: None,
        category: Some("Engajamento".to_string()),
        template_type: SurveyType::Custom,
        is_global,
        company_id: None,
        is_anonymous: true,
        questions: vec![],
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn global_templates_are_visible_to_every_company(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let acme = common::company(&pool, "Acme").await;
    let globex = common::company(&pool, "Globex").await;
    let acme_admin = common::company_admin(&pool, acme.id).await;
    let globex_admin = common::company_admin(&pool, globex.id).await;

    let global = state.template_service.create_template(&root, template_payload("Quick NPS", true)).await.unwrap();
    let private = state
        .template_service
        .create_template(&acme_admin, template_payload("Clima Acme", false))
        .await
        .unwrap();

    assert!(global.template.is_global);
    assert_eq!(private.template.company_id, Some(acme.id));

    let seen_by_acme = state.template_service.list_templates(&acme_admin, TemplateFilter::default()).await.unwrap();
    let seen_by_globex = state.template_service.list_templates(&globex_admin, TemplateFilter::default()).await.unwrap();

    assert!(seen_by_acme.iter().any(|t| t.id == global.template.id));
    assert!(seen_by_acme.iter().any(|t| t.id == private.template.id));
    assert!(seen_by_globex.iter().any(|t| t.id == global.template.id));
    assert!(!seen_by_globex.iter().any(|t| t.id == private.template.id));

    let err = state.template_service.get_template(&globex_admin, private.template.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn company_admin_cannot_publish_global_templates(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, acme.id).await;

    let created = state.template_service.create_template(&admin, template_payload("Tentativa", true)).await.unwrap();

    assert!(!created.template.is_global);
    assert_eq!(created.template.company_id, Some(acme.id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn global_templates_are_read_only_for_companies(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let acme = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, acme.id).await;

    let global = state.template_service.create_template(&root, template_payload("Quick NPS", true)).await.unwrap();

    let err = state.template_service.delete_template(&admin, global.template.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn department_admin_cannot_delete_a_site(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let plant = common::site(&pool, acme.id, "Fábrica Campinas").await;
    let hr = common::department(&pool, plant.id, "RH").await;
    let dept_admin = common::actor(&pool, Role::DepartmentAdmin, TenantScope::department(acme.id, plant.id, hr.id)).await;

    let err = state.tenant_service.delete_site(&dept_admin, plant.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let sites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sites WHERE id = $1")
        .bind(plant.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let departments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments WHERE site_id = $1")
        .bind(plant.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((sites, departments), (1, 1));

    // O company_admin da mesma empresa pode
    let admin = common::company_admin(&pool, acme.id).await;
    state.tenant_service.delete_site(&admin, plant.id).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn sites_of_another_company_are_hidden(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let globex = common::company(&pool, "Globex").await;
    let globex_site = common::site(&pool, globex.id, "Matriz").await;
    let acme_admin = common::company_admin(&pool, acme.id).await;

    let err = state.tenant_service.delete_site(&acme_admin, globex_site.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = state.tenant_service.list_companies(&acme_admin).await.unwrap();
    assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![acme.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn site_admin_creates_users_only_below_its_role(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let plant = common::site(&pool, acme.id, "Fábrica").await;
    let site_admin = common::actor(&pool, Role::SiteAdmin, TenantScope::site(acme.id, plant.id)).await;

    let payload = |role: Role| CreateUserPayload {
        email: format!("{}@acme.test", role.as_str()),
        password: "senha-forte".to_string(),
        first_name: None,
        last_name: None,
        role,
        company_id: None,
        site_id: Some(plant.id),
        department_id: None,
    };

    let err = state.user_service.create_user(&site_admin, payload(Role::CompanyAdmin)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let created = state.user_service.create_user(&site_admin, payload(Role::User)).await.unwrap();
    assert_eq!(created.company_id, Some(acme.id));
    assert_eq!(created.site_id, Some(plant.id));
    assert_eq!(created.role, Role::User);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn admins_cannot_rewrite_peers_or_superiors(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let plant = common::site(&pool, acme.id, "Fábrica").await;
    let hr = common::department(&pool, plant.id, "RH").await;

    let dept_admin = common::actor(&pool, Role::DepartmentAdmin, TenantScope::department(acme.id, plant.id, hr.id)).await;
    // Site admin lotado no mesmo departamento: dentro do escopo, mas acima na hierarquia
    let site_admin = common::actor(&pool, Role::SiteAdmin, TenantScope::department(acme.id, plant.id, hr.id)).await;

    let demote = UpdateUserPayload { role: Some(Role::User), ..Default::default() };
    let err = state.user_service.update_user(&dept_admin, site_admin.user_id, demote).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let deactivate = UpdateUserPayload { is_active: Some(false), ..Default::default() };
    let err = state.user_service.update_user(&dept_admin, site_admin.user_id, deactivate).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let admin = common::company_admin(&pool, acme.id).await;
    let peer = common::company_admin(&pool, acme.id).await;
    let demote = UpdateUserPayload { role: Some(Role::User), ..Default::default() };
    let err = state.user_service.update_user(&admin, peer.user_id, demote).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = state.user_service.delete_user(&admin, peer.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let role: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(peer.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(role, Role::CompanyAdmin);

    // Um superior ainda pode
    let demote = UpdateUserPayload { role: Some(Role::DepartmentAdmin), ..Default::default() };
    let updated = state.user_service.update_user(&admin, site_admin.user_id, demote).await.unwrap();
    assert_eq!(updated.role, Role::DepartmentAdmin);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn users_edit_only_their_own_name_and_password(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let plant = common::site(&pool, acme.id, "Fábrica").await;
    let admin = common::company_admin(&pool, acme.id).await;
    let employee = common::actor(&pool, Role::User, TenantScope::company(Some(acme.id))).await;

    let promote = UpdateUserPayload { role: Some(Role::CompanyAdmin), ..Default::default() };
    let err = state.user_service.update_user(&admin, admin.user_id, promote).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let escalate = UpdateUserPayload { role: Some(Role::SiteAdmin), ..Default::default() };
    let err = state.user_service.update_user(&employee, employee.user_id, escalate).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let relocate = UpdateUserPayload { site_id: Some(plant.id), ..Default::default() };
    let err = state.user_service.update_user(&employee, employee.user_id, relocate).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let rename = UpdateUserPayload {
        first_name: Some("Ana".to_string()),
        role: Some(Role::User),
        ..Default::default()
    };
    let me = state.user_service.update_user(&employee, employee.user_id, rename).await.unwrap();
    assert_eq!(me.first_name.as_deref(), Some("Ana"));
    assert_eq!(me.role, Role::User);
    assert_eq!(me.site_id, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn plain_users_see_open_surveys_but_no_templates_or_drafts(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let acme = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, acme.id).await;
    let employee = common::actor(&pool, Role::User, TenantScope::company(Some(acme.id))).await;

    let global = state.template_service.create_template(&root, template_payload("Quick NPS", true)).await.unwrap();
    let private = state
        .template_service
        .create_template(&admin, template_payload("Clima Acme", false))
        .await
        .unwrap();

    for id in [global.template.id, private.template.id] {
        let err = state.template_service.get_template(&employee, id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
    assert!(state.template_service.list_templates(&employee, TemplateFilter::default()).await.unwrap().is_empty());
    assert!(state.template_service.list_categories(&employee).await.unwrap().is_empty());

    let survey = |title: &str| CreateSurveyPayload {
        title: title.to_string(),
        description: None,
        survey_type: SurveyType::Custom,
        company_id: None,
        is_anonymous: Some(false),
        settings: None,
        starts_at: None,
        ends_at: None,
        questions: vec![common::question(QuestionType::Text, "Algo a dizer?", None, None)],
    };
    let draft = state.survey_service.create_blank(&admin, survey("Rascunho")).await.unwrap();
    let open = state.survey_service.create_blank(&admin, survey("Aberta")).await.unwrap();
    state.survey_service.change_status(&admin, open.survey.id, SurveyStatus::Active).await.unwrap();

    let err = state.survey_service.get_survey(&employee, draft.survey.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    state.survey_service.get_survey(&employee, open.survey.id).await.unwrap();

    let listed = state.survey_service.list_surveys(&employee, None).await.unwrap();
    assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![open.survey.id]);
    assert_eq!(state.survey_service.list_surveys(&admin, None).await.unwrap().len(), 2);

    // O rascunho continua recusando respostas com o erro de status
    let answers = vec![AnswerPayload { question_id: draft.questions[0].id, value: json!("oi") }];
    let err = state.response_service.submit_response(Some(&employee), draft.survey.id, answers).await.unwrap_err();
    assert!(matches!(err, AppError::SurveyNotAcceptingResponses));
}
