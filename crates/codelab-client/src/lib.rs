//! HTTP client SDK for the codelab execution API.
//!
//! # Example
//!
//! ```no_run
//! use codelab_client::{CodelabClient, ExecuteRequest, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = CodelabClient::builder()
//!     .base_url("http://localhost:5000")
//!     .auth_token("secret")
//!     .build()?;
//!
//! if client.health().is_healthy().await {
//!     let outcome = client
//!         .code()
//!         .execute(&ExecuteRequest::single("python", "print(42)"))
//!         .await?;
//!     println!("{}", outcome.output);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientBuilder, CodelabClient};
pub use error::{Error, Result};
pub use types::*;
