// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ResponseRepository, SurveyRepository, TemplateRepository, TenantRepository, UserRepository},
    services::{
        auth::AuthService, response_service::ResponseService, share_service::ShareService,
        survey_service::SurveyService, template_service::TemplateService, tenancy_service::TenantService,
        user_service::UserService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub public_base_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_expiration_days: i64,
    pub bootstrap_admin: Option<(String, String)>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.parse().with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bootstrap_admin = match (env::var("BOOTSTRAP_ADMIN_EMAIL"), env::var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:3000"),
            public_base_url: var_or("PUBLIC_BASE_URL", "http://localhost:5173"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            jwt_expiration_days: parse_var("JWT_EXPIRATION_DAYS", 7)?,
            bootstrap_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub user_service: UserService,
    pub template_service: TemplateService,
    pub survey_service: SurveyService,
    pub response_service: ResponseService,
    pub share_service: ShareService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new();
        let template_repo = TemplateRepository::new();
        let survey_repo = SurveyRepository::new();
        let response_repo = ResponseRepository::new();

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone(), config.jwt_expiration_days);
        let tenant_service = TenantService::new(tenant_repo.clone(), db_pool.clone());
        let user_service = UserService::new(user_repo, tenant_repo, db_pool.clone());
        let template_service = TemplateService::new(template_repo.clone(), db_pool.clone());
        let survey_service = SurveyService::new(survey_repo.clone(), template_repo, db_pool.clone());
        let response_service = ResponseService::new(response_repo, survey_repo, db_pool.clone());
        let share_service = ShareService::new(survey_service.clone(), config.public_base_url.clone());

        Self {
            db_pool,
            config,
            auth_service,
            tenant_service,
            user_service,
            template_service,
            survey_service,
            response_service,
            share_service,
        }
    }
}
