// src/services/access_policy.rs
//
// Política de acesso: uma única função pura (ator, recurso, ação) -> decisão.
// Todos os serviços chamam `decide`/`authorize` antes de ler ou escrever.

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::user::{Role, User};

/// O triplo de tenant ao qual um ator ou recurso pertence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantScope {
    pub company_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

impl TenantScope {
    pub fn company(company_id: Option<Uuid>) -> Self {
        Self { company_id, ..Self::default() }
    }

    pub fn site(company_id: Uuid, site_id: Uuid) -> Self {
        Self { company_id: Some(company_id), site_id: Some(site_id), department_id: None }
    }

    pub fn department(company_id: Uuid, site_id: Uuid, department_id: Uuid) -> Self {
        Self { company_id: Some(company_id), site_id: Some(site_id), department_id: Some(department_id) }
    }
}

/// Quem está pedindo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub scope: TenantScope,
}

impl Actor {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id,
            role: user.role,
            scope: TenantScope {
                company_id: user.company_id,
                site_id: user.site_id,
                department_id: user.department_id,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Site,
    Department,
    User,
    Template,
    Survey,
    Response,
}

impl ResourceKind {
    fn is_org(self) -> bool {
        matches!(self, ResourceKind::Company | ResourceKind::Site | ResourceKind::Department | ResourceKind::User)
    }
}

/// O recurso alvo: tipo, triplo dono e (quando existe) o usuário dono/criador.
/// `live` marca uma pesquisa aberta a respostas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub scope: TenantScope,
    pub owner_id: Option<Uuid>,
    pub live: bool,
}

impl Resource {
    pub fn new(kind: ResourceKind, scope: TenantScope) -> Self {
        Self { kind, scope, owner_id: None, live: false }
    }

    pub fn owned_by(mut self, owner_id: Option<Uuid>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    fn is_global(&self) -> bool {
        self.scope.company_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    // Responder uma pesquisa
    Respond,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

fn same(a: Option<Uuid>, b: Option<Uuid>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn deny(reason: impl Into<String>) -> Decision {
    Decision::Deny(reason.into())
}

/// Decide se `actor` pode executar `action` sobre `resource`. Nunca falha.
pub fn decide(actor: &Actor, resource: &Resource, action: Action) -> Decision {
    if actor.is_super_admin() {
        return Decision::Allow;
    }

    let destructive_kind = matches!(resource.kind, ResourceKind::Company | ResourceKind::Site | ResourceKind::User);
    if action == Action::Delete && destructive_kind && !actor.role.is_at_least(Role::CompanyAdmin) {
        return deny(format!("{} não pode excluir {:?}", actor.role.as_str(), resource.kind));
    }

    if resource.kind == ResourceKind::Company && action == Action::Create {
        return deny("apenas super_admin cria empresas");
    }

    if resource.kind.is_org() {
        return decide_org(actor, resource, action);
    }

    match resource.kind {
        ResourceKind::Template | ResourceKind::Survey => decide_content(actor, resource, action),
        ResourceKind::Response => decide_response(actor, resource, action),
        _ => deny("recurso desconhecido"),
    }
}

// Empresa / site / departamento / usuário: o escopo do papel é o teto.
fn decide_org(actor: &Actor, resource: &Resource, action: Action) -> Decision {
    if action == Action::Respond {
        return deny("ação inválida para recurso organizacional");
    }

    let target = &resource.scope;
    let mine = &actor.scope;

    let allowed = match actor.role {
        Role::SuperAdmin => true,
        Role::CompanyAdmin => same(target.company_id, mine.company_id),
        Role::SiteAdmin => same(target.site_id, mine.site_id),
        Role::DepartmentAdmin => same(target.department_id, mine.department_id),
        // Usuário comum: só o próprio cadastro (o serviço limita os campos)
        Role::User => {
            matches!(action, Action::Read | Action::Update)
                && resource.kind == ResourceKind::User
                && resource.owner_id == Some(actor.user_id)
        }
    };

    if allowed {
        Decision::Allow
    } else {
        deny(format!(
            "{} fora do escopo para {:?} em {:?}",
            actor.role.as_str(),
            action,
            resource.kind
        ))
    }
}

// Templates e pesquisas: pertencem a uma empresa (ou são globais).
fn decide_content(actor: &Actor, resource: &Resource, action: Action) -> Decision {
    let same_company = same(resource.scope.company_id, actor.scope.company_id);

    match action {
        Action::Read | Action::Respond if !resource.is_global() && !same_company => deny("conteúdo de outra empresa"),
        Action::Respond => Decision::Allow,
        // Abaixo de department_admin: nada de templates, e só pesquisas abertas
        Action::Read if actor.role.is_at_least(Role::DepartmentAdmin) => Decision::Allow,
        Action::Read => match resource.kind {
            ResourceKind::Survey if resource.live => Decision::Allow,
            ResourceKind::Survey => deny("pesquisa ainda não aberta a respostas"),
            _ => deny(format!("{} não consulta {:?}", actor.role.as_str(), resource.kind)),
        },
        Action::Create | Action::Update => {
            if resource.is_global() {
                deny("conteúdo global só pode ser alterado por super_admin")
            } else if !same_company {
                deny("conteúdo de outra empresa")
            } else if !actor.role.is_at_least(Role::DepartmentAdmin) {
                deny(format!("{} não pode editar {:?}", actor.role.as_str(), resource.kind))
            } else {
                Decision::Allow
            }
        }
        Action::Delete => {
            if resource.is_global() {
                deny("conteúdo global só pode ser excluído por super_admin")
            } else if !same_company {
                deny("conteúdo de outra empresa")
            } else if actor.role.is_at_least(Role::CompanyAdmin) {
                Decision::Allow
            } else if actor.role.is_at_least(Role::DepartmentAdmin) && resource.owner_id == Some(actor.user_id) {
                Decision::Allow
            } else {
                deny(format!("{} não pode excluir {:?} de terceiros", actor.role.as_str(), resource.kind))
            }
        }
    }
}

// Respostas: o escopo é o da pesquisa; o dono é o respondente.
fn decide_response(actor: &Actor, resource: &Resource, action: Action) -> Decision {
    let own = resource.owner_id == Some(actor.user_id);

    match action {
        Action::Read => {
            let admin_of_company = actor.role.is_at_least(Role::DepartmentAdmin)
                && same(resource.scope.company_id, actor.scope.company_id);
            if own || admin_of_company {
                Decision::Allow
            } else {
                deny("resposta de outro usuário")
            }
        }
        Action::Update if own => Decision::Allow,
        _ => deny("apenas o respondente altera a própria resposta"),
    }
}

/// Atalho para os serviços: `Deny` vira `AppError::Forbidden`.
pub fn authorize(actor: &Actor, resource: &Resource, action: Action) -> Result<(), AppError> {
    match decide(actor, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::warn!(user_id = %actor.user_id, role = actor.role.as_str(), %reason, "política de acesso negou a operação");
            Err(AppError::Forbidden(reason))
        }
    }
}

/// Para leituras: recurso fora da visibilidade é tratado como inexistente.
pub fn ensure_visible(
    actor: &Actor,
    resource: &Resource,
    not_found: crate::common::error::Entity,
) -> Result<(), AppError> {
    if decide(actor, resource, Action::Read).is_allowed() {
        Ok(())
    } else {
        Err(AppError::NotFound(not_found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct World {
        company_a: Uuid,
        company_b: Uuid,
        site_1: Uuid,
        site_2: Uuid,
        dept_x: Uuid,
        dept_y: Uuid,
    }

    fn world() -> World {
        World {
            company_a: Uuid::new_v4(),
            company_b: Uuid::new_v4(),
            site_1: Uuid::new_v4(),
            site_2: Uuid::new_v4(),
            dept_x: Uuid::new_v4(),
            dept_y: Uuid::new_v4(),
        }
    }

    fn actor(role: Role, scope: TenantScope) -> Actor {
        Actor { user_id: Uuid::new_v4(), role, scope }
    }

    #[test]
    fn super_admin_is_never_denied() {
        let w = world();
        let sa = actor(Role::SuperAdmin, TenantScope::default());
        for kind in [
            ResourceKind::Company,
            ResourceKind::Site,
            ResourceKind::Department,
            ResourceKind::User,
            ResourceKind::Template,
            ResourceKind::Survey,
            ResourceKind::Response,
        ] {
            for action in [Action::Read, Action::Create, Action::Update, Action::Delete, Action::Respond] {
                let res = Resource::new(kind, TenantScope::company(Some(w.company_b)));
                assert!(decide(&sa, &res, action).is_allowed(), "{kind:?} {action:?}");
            }
        }
    }

    #[test]
    fn org_scoping_table() {
        let w = world();
        let site_in_a = TenantScope::site(w.company_a, w.site_1);
        let other_site_in_a = TenantScope::site(w.company_a, w.site_2);
        let dept_x = TenantScope::department(w.company_a, w.site_1, w.dept_x);
        let dept_y = TenantScope::department(w.company_a, w.site_1, w.dept_y);

        let company_admin = actor(Role::CompanyAdmin, TenantScope::company(Some(w.company_a)));
        let site_admin = actor(Role::SiteAdmin, site_in_a);
        let dept_admin = actor(Role::DepartmentAdmin, dept_x);

        // (ator, alvo, ação, esperado)
        let cases: Vec<(&Actor, ResourceKind, TenantScope, Action, bool)> = vec![
            (&company_admin, ResourceKind::Site, other_site_in_a, Action::Update, true),
            (&company_admin, ResourceKind::Site, TenantScope::site(w.company_b, w.site_2), Action::Read, false),
            (&company_admin, ResourceKind::Company, TenantScope::company(Some(w.company_a)), Action::Delete, true),
            (&company_admin, ResourceKind::Company, TenantScope::company(Some(w.company_b)), Action::Read, false),
            (&site_admin, ResourceKind::Site, site_in_a, Action::Read, true),
            (&site_admin, ResourceKind::Site, other_site_in_a, Action::Read, false),
            (&site_admin, ResourceKind::Department, dept_y, Action::Update, true),
            (&site_admin, ResourceKind::Department, TenantScope::department(w.company_a, w.site_2, w.dept_y), Action::Update, false),
            (&site_admin, ResourceKind::Site, site_in_a, Action::Delete, false),
            (&dept_admin, ResourceKind::Department, dept_x, Action::Update, true),
            (&dept_admin, ResourceKind::Department, dept_y, Action::Read, false),
            (&dept_admin, ResourceKind::Site, site_in_a, Action::Delete, false),
            (&dept_admin, ResourceKind::User, dept_x, Action::Delete, false),
            (&dept_admin, ResourceKind::Company, TenantScope::company(Some(w.company_a)), Action::Create, false),
        ];

        for (who, kind, scope, action, expected) in cases {
            let res = Resource::new(kind, scope);
            assert_eq!(
                decide(who, &res, action).is_allowed(),
                expected,
                "{:?} {:?} {:?}",
                who.role,
                kind,
                action
            );
        }
    }

    #[test]
    fn site_admin_is_scoped_to_its_site() {
        let w = world();
        let site_admin = actor(Role::SiteAdmin, TenantScope::site(w.company_a, w.site_1));
        let s1 = Resource::new(ResourceKind::Site, TenantScope::site(w.company_a, w.site_1));
        let s2 = Resource::new(ResourceKind::Site, TenantScope::site(w.company_a, w.site_2));
        assert_eq!(decide(&site_admin, &s1, Action::Update), Decision::Allow);
        assert!(!decide(&site_admin, &s2, Action::Update).is_allowed());
    }

    #[test]
    fn plain_user_only_touches_itself() {
        let w = world();
        let user = actor(Role::User, TenantScope::department(w.company_a, w.site_1, w.dept_x));
        let me = Resource::new(ResourceKind::User, user.scope).owned_by(Some(user.user_id));
        let colleague = Resource::new(ResourceKind::User, user.scope).owned_by(Some(Uuid::new_v4()));

        assert!(decide(&user, &me, Action::Read).is_allowed());
        assert!(decide(&user, &me, Action::Update).is_allowed());
        assert!(!decide(&user, &me, Action::Delete).is_allowed());
        assert!(!decide(&user, &colleague, Action::Read).is_allowed());
        assert!(!decide(&user, &colleague, Action::Update).is_allowed());
        assert!(!decide(&user, &Resource::new(ResourceKind::Department, user.scope), Action::Read).is_allowed());
    }

    #[test]
    fn department_admin_cannot_delete_its_own_site() {
        let w = world();
        let dept_admin = actor(Role::DepartmentAdmin, TenantScope::department(w.company_a, w.site_1, w.dept_x));
        let site = Resource::new(ResourceKind::Site, TenantScope::site(w.company_a, w.site_1));
        match decide(&dept_admin, &site, Action::Delete) {
            Decision::Deny(reason) => assert!(!reason.is_empty()),
            Decision::Allow => panic!("department_admin não deveria excluir o site"),
        }
    }

    #[test]
    fn content_visibility_and_writes() {
        let w = world();
        let member_a = actor(Role::User, TenantScope::department(w.company_a, w.site_1, w.dept_x));
        let admin_a = actor(Role::DepartmentAdmin, TenantScope::department(w.company_a, w.site_1, w.dept_x));
        let company_admin_b = actor(Role::CompanyAdmin, TenantScope::company(Some(w.company_b)));

        let global = Resource::new(ResourceKind::Template, TenantScope::company(None));
        let owned_by_a = Resource::new(ResourceKind::Template, TenantScope::company(Some(w.company_a)));

        // Global: admins leem, ninguém (abaixo de super_admin) altera
        assert!(decide(&admin_a, &global, Action::Read).is_allowed());
        assert!(decide(&company_admin_b, &global, Action::Read).is_allowed());
        assert!(!decide(&company_admin_b, &global, Action::Update).is_allowed());
        assert!(!decide(&company_admin_b, &global, Action::Delete).is_allowed());

        // Da empresa A: só admins de A veem
        assert!(decide(&admin_a, &owned_by_a, Action::Read).is_allowed());
        assert!(!decide(&company_admin_b, &owned_by_a, Action::Read).is_allowed());

        // Escrita exige department_admin ou acima
        assert!(!decide(&member_a, &owned_by_a, Action::Create).is_allowed());
        assert!(decide(&admin_a, &owned_by_a, Action::Create).is_allowed());

        // Exclusão: company_admin, ou o próprio criador
        assert!(!decide(&admin_a, &owned_by_a, Action::Delete).is_allowed());
        assert!(decide(&admin_a, &owned_by_a.owned_by(Some(admin_a.user_id)), Action::Delete).is_allowed());
    }

    #[test]
    fn plain_users_see_only_open_surveys_and_no_templates() {
        let w = world();
        let member_a = actor(Role::User, TenantScope::department(w.company_a, w.site_1, w.dept_x));
        let admin_a = actor(Role::DepartmentAdmin, TenantScope::department(w.company_a, w.site_1, w.dept_x));

        let template = Resource::new(ResourceKind::Template, TenantScope::company(Some(w.company_a)));
        let global_template = Resource::new(ResourceKind::Template, TenantScope::company(None));
        let draft = Resource::new(ResourceKind::Survey, TenantScope::company(Some(w.company_a)));
        let open = draft.live(true);
        let open_elsewhere = Resource::new(ResourceKind::Survey, TenantScope::company(Some(w.company_b))).live(true);

        // (ator, recurso, ação, esperado)
        let cases: Vec<(&Actor, Resource, Action, bool)> = vec![
            (&member_a, template, Action::Read, false),
            (&member_a, global_template, Action::Read, false),
            (&member_a, draft, Action::Read, false),
            (&member_a, open, Action::Read, true),
            (&member_a, open_elsewhere, Action::Read, false),
            (&member_a, draft, Action::Respond, true),
            (&member_a, open_elsewhere, Action::Respond, false),
            (&admin_a, draft, Action::Read, true),
            (&admin_a, template, Action::Read, true),
        ];

        for (who, res, action, expected) in cases {
            assert_eq!(decide(who, &res, action).is_allowed(), expected, "{:?} {:?} {:?}", who.role, res, action);
        }
    }

    #[test]
    fn responses_are_private_to_respondent_and_company_admins() {
        let w = world();
        let respondent = actor(Role::User, TenantScope::company(Some(w.company_a)));
        let stranger = actor(Role::User, TenantScope::company(Some(w.company_a)));
        let admin_b = actor(Role::CompanyAdmin, TenantScope::company(Some(w.company_b)));
        let admin_a = actor(Role::CompanyAdmin, TenantScope::company(Some(w.company_a)));

        let response = Resource::new(ResourceKind::Response, TenantScope::company(Some(w.company_a)))
            .owned_by(Some(respondent.user_id));

        assert!(decide(&respondent, &response, Action::Read).is_allowed());
        assert!(decide(&respondent, &response, Action::Update).is_allowed());
        assert!(decide(&admin_a, &response, Action::Read).is_allowed());
        assert!(!decide(&admin_a, &response, Action::Update).is_allowed());
        assert!(!decide(&stranger, &response, Action::Read).is_allowed());
        assert!(!decide(&admin_b, &response, Action::Read).is_allowed());
    }

    #[test]
    fn authorize_turns_deny_into_forbidden() {
        let w = world();
        let user = actor(Role::User, TenantScope::company(Some(w.company_a)));
        let site = Resource::new(ResourceKind::Site, TenantScope::site(w.company_a, w.site_1));
        assert!(matches!(authorize(&user, &site, Action::Delete), Err(AppError::Forbidden(_))));
    }
}
