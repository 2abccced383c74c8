//! HTTP REST API interfaces
//!
//! - `common`: Response envelope, error mapping and the validating JSON extractor
//! - `middleware`: Bearer-token authentication
//! - `modules`: Handlers grouped by resource (health, auth, users)
//! - `router`: Route table and OpenAPI document

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};
