//! Execution backend abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ExecutionResult, RuntimeDescriptor, Submission};

// ─────────────────────────────────────────────────────────────────────────────
// Execution Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A remote service that can run submissions.
///
/// Implementations are stateless request wrappers; caching and
/// classification live above this trait.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Fetch the full list of runtimes the service supports.
    async fn runtimes(&self) -> Result<Vec<RuntimeDescriptor>>;

    /// Run a submission.
    ///
    /// A remote rejection with a response body comes back as
    /// `Ok(ExecutionResult { error: Some(body), .. })`. Failures with no
    /// response (connect, timeout) are `Err`.
    async fn execute(&self, submission: &Submission) -> Result<ExecutionResult>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Backend Type
// ─────────────────────────────────────────────────────────────────────────────

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn ExecutionBackend>;
