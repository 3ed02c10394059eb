pub mod auth;
pub mod response;
pub mod survey;
pub mod template;
pub mod tenancy;
pub mod user;
