//! Remote code execution for codelab.
//!
//! Untrusted source code is never run locally. Submissions are forwarded to
//! a sandboxed execution service (Piston) and its compile/run report is
//! reduced to a [`NormalizedOutcome`].
//!
//! # Pipeline
//!
//! ```text
//! Submission ─▶ validate ─▶ map_language ─▶ ExecutionBackend::execute ─▶ classify
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use codelab_executor::{CodeRunner, PistonBackend, SourceFile, Submission};
//!
//! let runner = CodeRunner::new(Arc::new(PistonBackend::from_env()?));
//! let submission = Submission::new("python", vec![SourceFile::new("main.py", "print(42)")]);
//! let classified = runner.run(submission).await?;
//! assert_eq!(classified.outcome.output, "42\n");
//! ```

pub mod backend;
pub mod cache;
pub mod classify;
pub mod error;
pub mod languages;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod piston;
pub mod runner;
pub mod types;

pub use backend::{ExecutionBackend, SharedBackend};
pub use cache::{DEFAULT_RUNTIME_TTL, RuntimeCache, Runtimes};
pub use classify::{Classification, OutcomeKind, RULES, Rule, classify, classify_with_kind};
pub use error::{ExecutorError, Result, SubmissionError};
pub use languages::map_language;
#[cfg(any(test, feature = "testing"))]
pub use mock::MockBackend;
pub use piston::{
    DEFAULT_EXECUTE_TIMEOUT, DEFAULT_PISTON_URL, DEFAULT_RUNTIMES_TIMEOUT, PISTON_URL_ENV,
    PistonBackend, PistonConfig,
};
pub use runner::CodeRunner;
pub use types::{
    DEFAULT_MAX_SOURCE_BYTES, ExecutionResult, LATEST_VERSION, NormalizedOutcome,
    RuntimeDescriptor, Signal, SourceFile, StageResult, Submission,
};
