pub mod auth;
pub mod public;
pub mod responses;
pub mod surveys;
pub mod templates;
pub mod tenancy;
pub mod users;
