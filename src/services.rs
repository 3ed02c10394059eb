pub mod access_policy;
pub mod auth;
pub mod response_service;
pub mod share_service;
pub mod survey_service;
pub mod template_service;
pub mod tenancy_service;
pub mod user_service;
