//! Health API.

use crate::client::{CodelabClient, handle_response};
use crate::error::{Error, Result};
use crate::types::HealthResponse;

/// Health API client.
///
/// The health endpoint needs no authentication and lives at the server root.
pub struct HealthApi {
    client: CodelabClient,
}

impl HealthApi {
    pub(crate) fn new(client: CodelabClient) -> Self {
        Self { client }
    }

    /// Check basic health.
    pub async fn check(&self) -> Result<HealthResponse> {
        let inner = self.client.inner();
        let url = inner.base_url.join("health").map_err(Error::from)?;

        let response = inner.http.get(url).timeout(inner.timeout).send().await?;
        handle_response(response).await
    }

    /// Simple connectivity check - returns true if the server is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }
}
