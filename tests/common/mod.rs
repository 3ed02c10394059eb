// tests/common/mod.rs
//
// Fixtures compartilhadas pelos testes de integração (banco real via #[sqlx::test]).

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use qualitivate::{
    common::json_column::JsonColumn,
    config::{AppState, Config},
    db::{user_repo::NewUser, TenantRepository, UserRepository},
    models::{
        survey::{QuestionPayload, QuestionType},
        tenancy::{Company, Department, Site},
        user::Role,
    },
    services::access_policy::{Actor, TenantScope},
};

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "segredo-de-teste".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        public_base_url: "https://app.qualitivate.test".to_string(),
        db_max_connections: 5,
        db_acquire_timeout: Duration::from_secs(3),
        jwt_expiration_days: 1,
        bootstrap_admin: None,
    }
}

pub fn state(pool: &PgPool) -> AppState {
    AppState::from_pool(pool.clone(), test_config())
}

pub async fn company(pool: &PgPool, name: &str) -> Company {
    let slug = format!("{}-{}", qualitivate::models::tenancy::slugify(name), Uuid::new_v4().simple());
    TenantRepository::new()
        .create_company(pool, name, &slug, None, None, None)
        .await
        .unwrap()
}

pub async fn site(pool: &PgPool, company_id: Uuid, name: &str) -> Site {
    TenantRepository::new()
        .create_site(pool, company_id, name, None)
        .await
        .unwrap()
}

pub async fn department(pool: &PgPool, site_id: Uuid, name: &str) -> Department {
    TenantRepository::new()
        .create_department(pool, site_id, name, None)
        .await
        .unwrap()
}

/// Cria um usuário direto no banco e devolve o ator correspondente.
pub async fn actor(pool: &PgPool, role: Role, scope: TenantScope) -> Actor {
    let email = format!("{}@qualitivate.test", Uuid::new_v4().simple());
    let user = UserRepository::new(pool.clone())
        .create_user(
            pool,
            NewUser {
                email: &email,
                password_hash: "hash-irrelevante",
                first_name: None,
                last_name: None,
                role,
                company_id: scope.company_id,
                site_id: scope.site_id,
                department_id: scope.department_id,
            },
        )
        .await
        .unwrap();

    Actor::from(&user)
}

pub async fn super_admin(pool: &PgPool) -> Actor {
    actor(pool, Role::SuperAdmin, TenantScope::default()).await
}

pub async fn company_admin(pool: &PgPool, company_id: Uuid) -> Actor {
    actor(pool, Role::CompanyAdmin, TenantScope::company(Some(company_id))).await
}

pub fn question(question_type: QuestionType, content: &str, options: Option<Value>, order_index: Option<i32>) -> QuestionPayload {
    QuestionPayload {
        question_type,
        content: content.to_string(),
        options: options.map(JsonColumn::from),
        is_required: false,
        order_index,
    }
}
