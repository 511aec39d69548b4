//! Scripted backend for tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::ExecutionBackend;
use crate::error::{ExecutorError, Result};
use crate::types::{ExecutionResult, RuntimeDescriptor, StageResult, Submission};

/// A mock backend for testing purposes.
///
/// Returns pre-configured replies in order and records every call, so tests
/// can assert how often (and with what) the remote would have been hit.
#[derive(Debug, Default)]
pub struct MockBackend {
    runtimes: Mutex<VecDeque<Result<Vec<RuntimeDescriptor>>>>,
    results: Mutex<VecDeque<Result<ExecutionResult>>>,
    runtime_calls: Mutex<usize>,
    request_log: Mutex<Vec<Submission>>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create an empty mock; every call fails until replies are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose single execute call prints `stdout` and exits 0.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self::new().push_result(Ok(ExecutionResult {
            run: Some(StageResult {
                stdout: stdout.into(),
                code: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    /// Queue a reply for the next `runtimes` call.
    pub fn push_runtimes(self, reply: Result<Vec<RuntimeDescriptor>>) -> Self {
        self.runtimes.lock().push_back(reply);
        self
    }

    /// Queue a reply for the next `execute` call.
    pub fn push_result(self, reply: Result<ExecutionResult>) -> Self {
        self.results.lock().push_back(reply);
        self
    }

    /// Sleep this long before answering `execute`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `runtimes` calls made.
    pub fn runtime_calls(&self) -> usize {
        *self.runtime_calls.lock()
    }

    /// Number of `execute` calls made.
    pub fn execute_calls(&self) -> usize {
        self.request_log.lock().len()
    }

    /// Submissions received by `execute`, in order.
    pub fn requests(&self) -> Vec<Submission> {
        self.request_log.lock().clone()
    }
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    async fn runtimes(&self) -> Result<Vec<RuntimeDescriptor>> {
        *self.runtime_calls.lock() += 1;
        self.runtimes.lock().pop_front().unwrap_or_else(|| {
            Err(ExecutorError::Network(
                "MockBackend: no more runtime replies available".to_string(),
            ))
        })
    }

    async fn execute(&self, submission: &Submission) -> Result<ExecutionResult> {
        self.request_log.lock().push(submission.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.results.lock().pop_front().unwrap_or_else(|| {
            Err(ExecutorError::Network(
                "MockBackend: no more execute replies available".to_string(),
            ))
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
