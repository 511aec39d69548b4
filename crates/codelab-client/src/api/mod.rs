//! API endpoint implementations.

mod code;
mod health;

pub use code::CodeApi;
pub use health::HealthApi;
