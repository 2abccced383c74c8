pub mod handlers;

pub use handlers::{health_check, root, HealthResponse, HealthState, ROOT_MESSAGE};
