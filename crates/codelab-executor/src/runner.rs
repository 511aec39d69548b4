//! Submission orchestration: validate, map, dispatch, classify.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::backend::SharedBackend;
use crate::cache::{RuntimeCache, Runtimes};
use crate::classify::{Classification, OutcomeKind, classify_with_kind};
use crate::error::Result;
use crate::languages::map_language;
use crate::types::{DEFAULT_MAX_SOURCE_BYTES, Submission};

/// Runs submissions against a backend and keeps the runtime cache.
pub struct CodeRunner {
    backend: SharedBackend,
    runtimes: RuntimeCache,
    max_source_bytes: usize,
}

impl CodeRunner {
    /// Create a runner with the default cache and size limit.
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            runtimes: RuntimeCache::default(),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }

    /// Replace the runtime cache.
    pub fn with_runtime_cache(mut self, cache: RuntimeCache) -> Self {
        self.runtimes = cache;
        self
    }

    /// Set the combined source size limit in bytes.
    pub fn with_max_source_bytes(mut self, limit: usize) -> Self {
        self.max_source_bytes = limit;
        self
    }

    /// The backend submissions are dispatched to.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// The runtime cache.
    pub fn runtime_cache(&self) -> &RuntimeCache {
        &self.runtimes
    }

    /// The combined source size limit in bytes.
    pub fn max_source_bytes(&self) -> usize {
        self.max_source_bytes
    }

    /// Supported runtimes, served from the cache while fresh.
    pub async fn languages(&self) -> Result<Runtimes> {
        self.runtimes.get(self.backend.as_ref()).await
    }

    /// Validate a submission and translate its language for the remote.
    ///
    /// Nothing is sent anywhere; a rejected submission never reaches the
    /// backend.
    pub fn prepare(&self, mut submission: Submission) -> Result<Submission> {
        submission.validate(self.max_source_bytes)?;

        let mapped = map_language(&submission.language);
        if mapped != submission.language {
            debug!(from = %submission.language, to = %mapped, "Mapped language");
            submission.language = mapped.to_string();
        }
        Ok(submission)
    }

    /// Run a submission and classify the remote's answer.
    ///
    /// Logical failures (compile errors, crashes, kills, remote rejections)
    /// are `Ok` with an unsuccessful outcome. `Err` means the submission was
    /// invalid or the remote could not be reached.
    pub async fn run(&self, submission: Submission) -> Result<Classification> {
        let submission = match self.prepare(submission) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Rejected submission");
                return Err(e);
            }
        };

        let start = Instant::now();
        let result = self.backend.execute(&submission).await?;
        let classification = classify_with_kind(&result);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match classification.kind {
            OutcomeKind::RemoteError => warn!(
                backend = self.backend.name(),
                language = %submission.language,
                elapsed_ms,
                error = classification.outcome.error.as_deref().unwrap_or_default(),
                "Remote rejected submission"
            ),
            kind => info!(
                backend = self.backend.name(),
                language = %submission.language,
                version = %submission.version,
                outcome = ?kind,
                elapsed_ms,
                "Execution finished"
            ),
        }

        Ok(classification)
    }
}
