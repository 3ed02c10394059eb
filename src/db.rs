pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod template_repo;
pub use template_repo::TemplateRepository;
pub mod survey_repo;
pub use survey_repo::SurveyRepository;
pub mod response_repo;
pub use response_repo::ResponseRepository;
