//! Piston API backend implementation.
//!
//! Piston exposes two endpoints under its base URL:
//! - `GET  {base}/runtimes` lists supported languages
//! - `POST {base}/execute`  runs a submission and reports compile/run stages

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::backend::ExecutionBackend;
use crate::error::{ExecutorError, Result};
use crate::types::{ExecutionResult, RuntimeDescriptor, Submission};

/// Public Piston instance used when nothing else is configured.
pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";

/// Environment variable overriding the base URL.
pub const PISTON_URL_ENV: &str = "PISTON_API_URL";

/// Default timeout for listing runtimes.
pub const DEFAULT_RUNTIMES_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for an execute call.
pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(20);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Piston backend.
#[derive(Debug, Clone)]
pub struct PistonConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,

    /// Timeout for `GET /runtimes`.
    pub runtimes_timeout: Duration,

    /// Timeout for `POST /execute`.
    pub execute_timeout: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl Default for PistonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PISTON_URL.to_string(),
            runtimes_timeout: DEFAULT_RUNTIMES_TIMEOUT,
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
            name: "piston".to_string(),
        }
    }
}

impl PistonConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Create a config from `PISTON_API_URL`, falling back to the public instance.
    pub fn from_env() -> Self {
        match std::env::var(PISTON_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the runtimes timeout.
    pub fn with_runtimes_timeout(mut self, timeout: Duration) -> Self {
        self.runtimes_timeout = timeout;
        self
    }

    /// Set the execute timeout.
    pub fn with_execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout = timeout;
        self
    }

    /// Set the backend name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Piston Backend
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for a Piston instance.
pub struct PistonBackend {
    client: Client,
    config: PistonConfig,
}

impl PistonBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: PistonConfig) -> Result<Self> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ExecutorError::Config(format!(
                "Piston base URL must be http(s): {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .user_agent(format!("codelab/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExecutorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a backend from environment.
    pub fn from_env() -> Result<Self> {
        Self::new(PistonConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> &PistonConfig {
        &self.config
    }

    fn runtimes_url(&self) -> String {
        format!("{}/runtimes", self.config.base_url)
    }

    fn execute_url(&self) -> String {
        format!("{}/execute", self.config.base_url)
    }

    /// Read a non-success body as JSON, keeping plain text as a string.
    async fn error_body(response: Response) -> Value {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if text.trim().is_empty() {
            return serde_json::json!({ "message": format!("HTTP {}", status) });
        }
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}

#[async_trait]
impl ExecutionBackend for PistonBackend {
    async fn runtimes(&self) -> Result<Vec<RuntimeDescriptor>> {
        tracing::debug!(backend = %self.config.name, url = %self.runtimes_url(), "Fetching runtimes");

        let response = self
            .client
            .get(self.runtimes_url())
            .timeout(self.config.runtimes_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(ExecutorError::Remote {
                status: status.as_u16(),
                message: body.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn execute(&self, submission: &Submission) -> Result<ExecutionResult> {
        tracing::debug!(
            backend = %self.config.name,
            language = %submission.language,
            version = %submission.version,
            files = submission.files.len(),
            "Sending execute request"
        );

        let response = self
            .client
            .post(self.execute_url())
            .json(submission)
            .timeout(self.config.execute_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            tracing::warn!(
                backend = %self.config.name,
                status = status.as_u16(),
                body = %body,
                "Remote rejected execute request"
            );
            return Ok(ExecutionResult::remote_error(body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceFile;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> PistonBackend {
        PistonBackend::new(PistonConfig::new(server.uri())).unwrap()
    }

    fn hello() -> Submission {
        Submission::new("python3", vec![SourceFile::new("main.py", "print('hi')")])
    }

    #[test]
    fn test_default_config() {
        let config = PistonConfig::default();
        assert_eq!(config.base_url, "https://emkc.org/api/v2/piston");
        assert_eq!(config.runtimes_timeout, Duration::from_secs(15));
        assert_eq!(config.execute_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = PistonBackend::new(PistonConfig::new("http://localhost:2000/api/v2/")).unwrap();
        assert_eq!(backend.execute_url(), "http://localhost:2000/api/v2/execute");
        assert_eq!(backend.runtimes_url(), "http://localhost:2000/api/v2/runtimes");
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(PistonBackend::new(PistonConfig::new("ftp://example.com")).is_err());
    }

    #[tokio::test]
    async fn test_runtimes_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/runtimes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"language": "python", "version": "3.10.0", "aliases": ["py", "python3"], "runtime": null},
                {"language": "go", "version": "1.16.2"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let runtimes = backend_for(&server).runtimes().await.unwrap();
        assert_eq!(runtimes.len(), 2);
        assert_eq!(runtimes[0].aliases, vec!["py", "python3"]);
        assert!(runtimes[1].aliases.is_empty());
    }

    #[tokio::test]
    async fn test_runtimes_error_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/runtimes"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend_for(&server).runtimes().await.unwrap_err();
        assert!(matches!(err, ExecutorError::Remote { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_execute_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .and(body_partial_json(json!({"language": "python3", "version": "*"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "language": "python",
                "version": "3.10.0",
                "run": {"stdout": "hi\n", "stderr": "", "code": 0, "signal": null, "output": "hi\n"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = backend_for(&server).execute(&hello()).await.unwrap();
        assert!(result.error.is_none());
        assert_eq!(result.run.unwrap().stdout, "hi\n");
    }

    #[tokio::test]
    async fn test_execute_rejection_becomes_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"message": "brainfudge-9 runtime is unknown"})),
            )
            .mount(&server)
            .await;

        let result = backend_for(&server).execute(&hello()).await.unwrap();
        assert_eq!(result.error_message(), Some("brainfudge-9 runtime is unknown"));
    }

    #[tokio::test]
    async fn test_execute_plain_text_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = backend_for(&server).execute(&hello()).await.unwrap();
        assert_eq!(result.error, Some(Value::String("Bad Gateway".to_string())));
    }

    #[tokio::test]
    async fn test_execute_timeout_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"run": {"stdout": "late", "code": 0}}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let backend = PistonBackend::new(
            PistonConfig::new(server.uri()).with_execute_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = backend.execute(&hello()).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }
}
