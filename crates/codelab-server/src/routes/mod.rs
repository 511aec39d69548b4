//! API routes.

pub mod code;
pub mod health;

pub use code::{execute_handler, languages_handler};
pub use health::{HealthResponse, health_routes};
