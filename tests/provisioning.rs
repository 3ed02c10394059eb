// tests/provisioning.rs
//
// Criação de pesquisas a partir de templates contra um Postgres real.
// Rodar com: DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use qualitivate::{
    common::error::AppError,
    models::{
        survey::{ProvisionOverrides, QuestionType, SurveyStatus, SurveyType, UpdateSurveyPayload},
        template::{CreateTemplatePayload, TemplateDetail, UpdateTemplatePayload},
    },
    services::access_policy::Actor,
};

async fn quick_nps(state: &qualitivate::config::AppState, admin: &Actor) -> TemplateDetail {
    state
        .template_service
        .create_template(
            admin,
            CreateTemplatePayload {
                name: "Quick NPS".to_string(),
                description: Some("Pulso rápido de satisfação".to_string()),
                category: Some("Engajamento".to_string()),
                template_type: SurveyType::Nps,
                is_global: true,
                company_id: None,
                is_anonymous: true,
                questions: vec![
                    common::question(QuestionType::Nps, "De 0 a 10, você nos recomendaria?", None, None),
                    common::question(QuestionType::Textarea, "O que podemos melhorar?", None, None),
                ],
            },
        )
        .await
        .unwrap()
}

async fn use_count(pool: &PgPool, template_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT use_count FROM templates WHERE id = $1")
        .bind(template_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn survey_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM surveys").fetch_one(pool).await.unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn quick_nps_from_global_template(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;

    let template = quick_nps(&state, &root).await;
    sqlx::query("UPDATE templates SET use_count = 3 WHERE id = $1")
        .bind(template.template.id)
        .execute(&pool)
        .await
        .unwrap();

    let detail = state
        .survey_service
        .create_from_template(
            &admin,
            template.template.id,
            ProvisionOverrides { title: Some("Q1 Check-in".to_string()), company_id: None },
        )
        .await
        .unwrap();

    assert_eq!(detail.survey.title, "Q1 Check-in");
    assert_eq!(detail.survey.company_id, Some(company.id));
    assert_eq!(detail.survey.template_id, Some(template.template.id));
    assert_eq!(detail.survey.status, SurveyStatus::Draft);
    assert_eq!(detail.survey.survey_type, SurveyType::Nps);
    assert_eq!(detail.survey.created_by, admin.user_id);
    assert_eq!(detail.questions.iter().map(|q| q.order_index).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(detail.questions[0].question_type, QuestionType::Nps);
    assert_eq!(use_count(&pool, template.template.id).await, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn default_title_uses_template_name_and_date(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;
    let template = quick_nps(&state, &root).await;

    let detail = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap();

    assert!(detail.survey.title.starts_with("Quick NPS - "));
    assert_eq!(detail.survey.description.as_deref(), Some("Pulso rápido de satisfação"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn failed_question_copy_leaves_nothing_behind(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;
    let template = quick_nps(&state, &root).await;

    // A segunda pergunta copiada falha dentro da transação
    sqlx::query(
        r#"
        CREATE FUNCTION fail_second_question() RETURNS trigger AS $$
        BEGIN
            IF NEW.order_index = 1 THEN
                RAISE EXCEPTION 'falha simulada';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER fail_second_question BEFORE INSERT ON questions \
         FOR EACH ROW EXECUTE FUNCTION fail_second_question()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(_)));
    assert_eq!(survey_count(&pool).await, 0);
    let questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions").fetch_one(&pool).await.unwrap();
    assert_eq!(questions, 0);
    assert_eq!(use_count(&pool, template.template.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn question_order_follows_order_index(pool: PgPool) {
    let state = common::state(&pool);
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;

    let template = state
        .template_service
        .create_template(
            &admin,
            CreateTemplatePayload {
                name: "Clima".to_string(),
                description: None,
                category: None,
                template_type: SurveyType::Custom,
                is_global: false,
                company_id: None,
                is_anonymous: false,
                questions: vec![
                    common::question(QuestionType::Text, "terceira", None, Some(2)),
                    common::question(QuestionType::Text, "primeira", None, Some(0)),
                    common::question(QuestionType::Text, "segunda", None, Some(1)),
                ],
            },
        )
        .await
        .unwrap();

    let created = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap();
    let fetched = state.survey_service.get_survey(&admin, created.survey.id).await.unwrap();

    for detail in [&created, &fetched] {
        let contents: Vec<&str> = detail.questions.iter().map(|q| q.content.as_str()).collect();
        assert_eq!(contents, vec!["primeira", "segunda", "terceira"]);
        assert_eq!(detail.questions.iter().map(|q| q.order_index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
    assert!(!fetched.survey.is_anonymous);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn concurrent_provisioning_counts_every_call(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;
    let template = quick_nps(&state, &root).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let service = state.survey_service.clone();
        let template_id = template.template.id;
        handles.push(tokio::spawn(async move {
            service
                .create_from_template(&admin, template_id, ProvisionOverrides::default())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(use_count(&pool, template.template.id).await, 5);
    assert_eq!(survey_count(&pool).await, 5);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn options_stay_structured_end_to_end(pool: PgPool) {
    let state = common::state(&pool);
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;

    let options = json!({ "choices": ["Sim", "Não", "Talvez"] });
    let template = state
        .template_service
        .create_template(
            &admin,
            CreateTemplatePayload {
                name: "Escolha".to_string(),
                description: None,
                category: None,
                template_type: SurveyType::Custom,
                is_global: false,
                company_id: None,
                is_anonymous: true,
                questions: vec![common::question(QuestionType::SingleChoice, "Gostou?", Some(options.clone()), None)],
            },
        )
        .await
        .unwrap();

    let survey = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap();

    let copied = survey.questions[0].options.as_ref().unwrap();
    assert_eq!(copied.as_value(), &options);

    // No banco é um objeto JSONB, não uma string
    let kind: String = sqlx::query_scalar("SELECT jsonb_typeof(options) FROM questions WHERE survey_id = $1")
        .bind(survey.survey.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kind, "object");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn double_encoded_options_are_read_as_structure(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let template = quick_nps(&state, &root).await;

    // Linha legada gravada com o JSON serializado dentro de uma string
    sqlx::query(
        r#"
        INSERT INTO template_questions (template_id, type, content, options, order_index)
        VALUES ($1, 'single_choice', 'Legado', to_jsonb('{"choices":["A","B"]}'::text), 5)
        "#,
    )
    .bind(template.template.id)
    .execute(&pool)
    .await
    .unwrap();

    let detail = state.template_service.get_template(&root, template.template.id).await.unwrap();
    let legacy = detail.questions.iter().find(|q| q.content == "Legado").unwrap();
    assert_eq!(legacy.options.as_ref().unwrap().as_value(), &json!({ "choices": ["A", "B"] }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn duplicate_keeps_questions_without_touching_use_count(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;
    let template = quick_nps(&state, &root).await;

    let original = state
        .survey_service
        .create_from_template(
            &admin,
            template.template.id,
            ProvisionOverrides { title: Some("Q1 Check-in".to_string()), company_id: None },
        )
        .await
        .unwrap();

    let copy = state
        .survey_service
        .duplicate_survey(&admin, original.survey.id, ProvisionOverrides::default())
        .await
        .unwrap();

    assert_eq!(copy.survey.title, "Q1 Check-in (Copy)");
    assert_eq!(copy.survey.status, SurveyStatus::Draft);
    assert_eq!(copy.questions.len(), original.questions.len());
    assert_ne!(copy.survey.id, original.survey.id);
    assert_eq!(use_count(&pool, template.template.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn template_of_another_company_is_not_found(pool: PgPool) {
    let state = common::state(&pool);
    let acme = common::company(&pool, "Acme").await;
    let globex = common::company(&pool, "Globex").await;
    let acme_admin = common::company_admin(&pool, acme.id).await;
    let globex_admin = common::company_admin(&pool, globex.id).await;

    let private = state
        .template_service
        .create_template(
            &acme_admin,
            CreateTemplatePayload {
                name: "Interno".to_string(),
                description: None,
                category: None,
                template_type: SurveyType::Custom,
                is_global: false,
                company_id: None,
                is_anonymous: true,
                questions: vec![],
            },
        )
        .await
        .unwrap();

    let err = state
        .survey_service
        .create_from_template(&globex_admin, private.template.id, ProvisionOverrides::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(use_count(&pool, private.template.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn empty_template_provisions_an_empty_survey(pool: PgPool) {
    let state = common::state(&pool);
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;

    let template = state
        .template_service
        .create_template(
            &admin,
            CreateTemplatePayload {
                name: "Em branco".to_string(),
                description: None,
                category: None,
                template_type: SurveyType::Custom,
                is_global: false,
                company_id: None,
                is_anonymous: false,
                questions: vec![],
            },
        )
        .await
        .unwrap();
    assert!(template.questions.is_empty());

    let detail = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap();

    assert!(detail.questions.is_empty());
    assert_eq!(detail.survey.template_id, Some(template.template.id));
    assert!(!detail.survey.is_anonymous);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE survey_id = $1")
        .bind(detail.survey.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
    assert_eq!(use_count(&pool, template.template.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL apontando para um Postgres"]
async fn explicit_null_clears_optional_fields(pool: PgPool) {
    let state = common::state(&pool);
    let root = common::super_admin(&pool).await;
    let company = common::company(&pool, "Acme").await;
    let admin = common::company_admin(&pool, company.id).await;
    let template = quick_nps(&state, &root).await;

    let survey = state
        .survey_service
        .create_from_template(&admin, template.template.id, ProvisionOverrides::default())
        .await
        .unwrap();
    assert!(survey.survey.description.is_some());

    let patch: UpdateSurveyPayload = serde_json::from_value(json!({
        "endsAt": "2026-12-31T23:59:59Z",
        "settings": { "theme": "dark" }
    }))
    .unwrap();
    let scheduled = state.survey_service.update_survey(&admin, survey.survey.id, patch).await.unwrap();
    assert!(scheduled.ends_at.is_some());

    // Só o que veio como null é limpo; o resto fica como estava
    let patch: UpdateSurveyPayload =
        serde_json::from_value(json!({ "description": null, "endsAt": null })).unwrap();
    let cleared = state.survey_service.update_survey(&admin, survey.survey.id, patch).await.unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.ends_at, None);
    assert_eq!(cleared.title, survey.survey.title);
    assert_eq!(cleared.settings.unwrap().as_value(), &json!({ "theme": "dark" }));

    let own = state
        .template_service
        .create_template(
            &admin,
            CreateTemplatePayload {
                name: "Clima".to_string(),
                description: Some("Trimestral".to_string()),
                category: Some("Engajamento".to_string()),
                template_type: SurveyType::Custom,
                is_global: false,
                company_id: None,
                is_anonymous: true,
                questions: vec![],
            },
        )
        .await
        .unwrap();
    let patch: UpdateTemplatePayload = serde_json::from_value(json!({ "category": null })).unwrap();
    let updated = state.template_service.update_template(&admin, own.template.id, patch).await.unwrap();
    assert_eq!(updated.template.category, None);
    assert_eq!(updated.template.description.as_deref(), Some("Trimestral"));
}
