// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::db_utils::map_unique_violation;
use crate::common::error::AppError;
use crate::models::user::{Role, User};

// Campos de um novo usuário, já com a senha em hash
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

// Alterações parciais; `None` mantém o valor atual
#[derive(Default)]
pub struct UserChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub role: Option<Role>,
    pub site_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub password_hash: Option<&'a str>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role, company_id, site_id, department_id)
            VALUES (lower($1), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.role)
        .bind(new_user.company_id)
        .bind(new_user.site_id)
        .bind(new_user.department_id)
        .fetch_one(executor)
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| map_unique_violation(e, "Este e-mail já está em uso."))
    }

    /// Lista usuários dentro do triplo informado (cada filtro `None` é ignorado).
    pub async fn list_users<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        site_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND ($2::uuid IS NULL OR site_id = $2)
              AND ($3::uuid IS NULL OR department_id = $3)
            ORDER BY email ASC
            "#,
        )
        .bind(company_id)
        .bind(site_id)
        .bind(department_id)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: UserChanges<'_>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                site_id = COALESCE($5, site_id),
                department_id = COALESCE($6, department_id),
                is_active = COALESCE($7, is_active),
                password_hash = COALESCE($8, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role)
        .bind(changes.site_id)
        .bind(changes.department_id)
        .bind(changes.is_active)
        .bind(changes.password_hash)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
