// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, Entity},
    db::{
        user_repo::{NewUser, UserChanges},
        TenantRepository, UserRepository,
    },
    models::user::{CreateUserPayload, Role, UpdateUserPayload, User},
    services::{
        access_policy::{authorize, ensure_visible, Action, Actor, Resource, ResourceKind, TenantScope},
        auth::hash_password,
    },
};

/// Um ator só atribui papéis abaixo do seu; super_admin atribui qualquer um.
pub fn can_assign_role(actor_role: Role, target: Role) -> bool {
    actor_role == Role::SuperAdmin || actor_role.rank() > target.rank()
}

/// Alterar ou excluir outro usuário exige papel estritamente acima do dele.
fn ensure_outranks(actor: &Actor, target: &User) -> Result<(), AppError> {
    if can_assign_role(actor.role, target.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} não pode alterar um usuário {}",
            actor.role.as_str(),
            target.role.as_str()
        )))
    }
}

fn user_resource(user: &User) -> Resource {
    Resource::new(
        ResourceKind::User,
        TenantScope {
            company_id: user.company_id,
            site_id: user.site_id,
            department_id: user.department_id,
        },
    )
    .owned_by(Some(user.id))
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { user_repo, tenant_repo, pool }
    }

    /// Confere que departamento ⊂ site ⊂ empresa. Devolve o triplo completo.
    async fn resolve_placement(
        &self,
        company_id: Option<Uuid>,
        site_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<TenantScope, AppError> {
        let mut scope = TenantScope { company_id, site_id, department_id };

        if let Some(department_id) = department_id {
            let dept = self
                .tenant_repo
                .find_department_scope(&self.pool, department_id)
                .await?
                .ok_or_else(|| AppError::InvalidInput("Departamento informado não existe.".into()))?;

            if site_id.is_some_and(|s| s != dept.site_id) {
                return Err(AppError::InvalidInput("O departamento não pertence ao site informado.".into()));
            }
            if company_id.is_some_and(|c| c != dept.company_id) {
                return Err(AppError::InvalidInput("O departamento não pertence à empresa informada.".into()));
            }
            scope = TenantScope::department(dept.company_id, dept.site_id, dept.department_id);
        } else if let Some(site_id) = site_id {
            let site = self
                .tenant_repo
                .find_site(&self.pool, site_id)
                .await?
                .ok_or_else(|| AppError::InvalidInput("Site informado não existe.".into()))?;

            if company_id.is_some_and(|c| c != site.company_id) {
                return Err(AppError::InvalidInput("O site não pertence à empresa informada.".into()));
            }
            scope = TenantScope::site(site.company_id, site.id);
        }

        Ok(scope)
    }

    pub async fn create_user(&self, actor: &Actor, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        if !can_assign_role(actor.role, payload.role) {
            return Err(AppError::Forbidden(format!(
                "{} não pode atribuir o papel {}",
                actor.role.as_str(),
                payload.role.as_str()
            )));
        }

        // Fora do super_admin, o usuário nasce na empresa de quem o cria
        let company_id = if actor.is_super_admin() {
            payload.company_id
        } else {
            match (payload.company_id, actor.scope.company_id) {
                (Some(requested), Some(own)) if requested != own => {
                    return Err(AppError::Forbidden("empresa diferente da do ator".into()));
                }
                (_, own) => own,
            }
        };

        let scope = self.resolve_placement(company_id, payload.site_id, payload.department_id).await?;
        if payload.role != Role::SuperAdmin && scope.company_id.is_none() {
            return Err(AppError::InvalidInput("Usuários que não são super_admin precisam de uma empresa.".into()));
        }
        authorize(actor, &Resource::new(ResourceKind::User, scope), Action::Create)?;

        let password_hash = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                NewUser {
                    email: payload.email.trim(),
                    password_hash: &password_hash,
                    first_name: payload.first_name.as_deref(),
                    last_name: payload.last_name.as_deref(),
                    role: payload.role,
                    company_id: scope.company_id,
                    site_id: scope.site_id,
                    department_id: scope.department_id,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), by = %actor.user_id, "usuário criado");
        Ok(user)
    }

    /// Lista os usuários dentro do escopo do papel do ator.
    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, AppError> {
        let s = &actor.scope;
        let (company, site, department) = match actor.role {
            Role::SuperAdmin => (None, None, None),
            Role::CompanyAdmin => (s.company_id, None, None),
            Role::SiteAdmin => (s.company_id, s.site_id, None),
            Role::DepartmentAdmin => (s.company_id, s.site_id, s.department_id),
            Role::User => {
                let me = self.user_repo.find_by_id(actor.user_id).await?;
                return Ok(me.into_iter().collect());
            }
        };

        // Admin sem o nível correspondente preenchido não vê ninguém
        let incomplete = match actor.role {
            Role::CompanyAdmin => company.is_none(),
            Role::SiteAdmin => site.is_none(),
            Role::DepartmentAdmin => department.is_none(),
            _ => false,
        };
        if incomplete {
            return Ok(Vec::new());
        }

        self.user_repo.list_users(&self.pool, company, site, department).await
    }

    pub async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<User, AppError> {
        let user = self.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound(Entity::User))?;
        ensure_visible(actor, &user_resource(&user), Entity::User)?;
        Ok(user)
    }

    pub async fn update_user(&self, actor: &Actor, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        payload.validate()?;
        let user = self.get_user(actor, id).await?;
        authorize(actor, &user_resource(&user), Action::Update)?;

        let is_self = user.id == actor.user_id;
        if is_self {
            // Sobre si mesmo: apenas nome e senha
            let changes_role = payload.role.is_some_and(|r| r != user.role);
            let changes_active = payload.is_active.is_some_and(|a| a != user.is_active);
            let moves = payload.site_id.is_some_and(|s| Some(s) != user.site_id)
                || payload.department_id.is_some_and(|d| Some(d) != user.department_id);
            if changes_role || changes_active || moves {
                return Err(AppError::Forbidden(
                    "papel, status e lotação do próprio usuário só mudam por um superior".into(),
                ));
            }
        } else {
            ensure_outranks(actor, &user)?;
        }

        if let Some(role) = payload.role {
            if role != user.role && !can_assign_role(actor.role, role) {
                return Err(AppError::Forbidden(format!(
                    "{} não pode atribuir o papel {}",
                    actor.role.as_str(),
                    role.as_str()
                )));
            }
        }

        // Mudança de lotação: continua dentro da empresa do usuário
        let mut site_id = payload.site_id;
        let mut department_id = payload.department_id;
        if !is_self && (site_id.is_some() || department_id.is_some()) {
            let scope = self.resolve_placement(user.company_id, site_id, department_id).await?;
            authorize(actor, &Resource::new(ResourceKind::User, scope), Action::Update)?;
            site_id = scope.site_id;
            department_id = scope.department_id;
        }

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let updated = self
            .user_repo
            .update_user(
                &self.pool,
                id,
                UserChanges {
                    first_name: payload.first_name.as_deref(),
                    last_name: payload.last_name.as_deref(),
                    role: payload.role,
                    site_id,
                    department_id,
                    is_active: payload.is_active,
                    password_hash: password_hash.as_deref(),
                },
            )
            .await?
            .ok_or(AppError::NotFound(Entity::User))?;

        Ok(updated)
    }

    pub async fn delete_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        if actor.user_id == id {
            return Err(AppError::InvalidInput("Não é possível excluir o próprio usuário.".into()));
        }

        let user = self.get_user(actor, id).await?;
        authorize(actor, &user_resource(&user), Action::Delete)?;
        ensure_outranks(actor, &user)?;

        self.user_repo.delete_user(&self.pool, id).await?;
        tracing::info!(user_id = %id, by = %actor.user_id, "usuário excluído");
        Ok(())
    }

    /// Garante um super_admin inicial (usado na subida do servidor).
    pub async fn ensure_super_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password).await?;
        let user = self
            .user_repo
            .create_user(
                &self.pool,
                NewUser {
                    email,
                    password_hash: &password_hash,
                    first_name: None,
                    last_name: None,
                    role: Role::SuperAdmin,
                    company_id: None,
                    site_id: None,
                    department_id: None,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "super_admin inicial criado");
        Ok(())
    }
}
