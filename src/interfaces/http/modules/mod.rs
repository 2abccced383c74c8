//! Feature modules of the REST API, one per resource.

pub mod auth;
pub mod health;
pub mod users;
