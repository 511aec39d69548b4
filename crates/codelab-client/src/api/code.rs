//! Code execution API.

use crate::client::CodelabClient;
use crate::error::Result;
use crate::types::{ExecuteRequest, ExecuteResponse, Runtime};

/// Code execution API client.
pub struct CodeApi {
    client: CodelabClient,
}

impl CodeApi {
    pub(crate) fn new(client: CodelabClient) -> Self {
        Self { client }
    }

    /// List the runtimes the server can execute.
    pub async fn languages(&self) -> Result<Vec<Runtime>> {
        self.client.get("code/languages").await
    }

    /// Execute a submission.
    ///
    /// Compile errors and crashes come back as `Ok` with `success: false`.
    /// `Err` means the request itself failed (auth, rate limit, timeout).
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        self.client.post("code/execute", request).await
    }
}
