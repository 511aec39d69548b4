//! Request and response types for the codelab API.
//!
//! These types mirror the server's API contract.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Server version.
    #[serde(default)]
    pub version: String,
    /// Server time (RFC 3339).
    #[serde(default)]
    pub time: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Code execution
// ─────────────────────────────────────────────────────────────────────────────

/// A runtime the execution service supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    /// Language name.
    pub language: String,
    /// Installed version.
    pub version: String,
    /// Alternate names accepted for the language.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// One source file in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name; the service picks one when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// File contents.
    pub content: String,
}

impl SourceFile {
    /// A named source file.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /api/code/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Language name or alias.
    pub language: String,
    /// Runtime version, `*` for the latest.
    pub version: String,
    /// Source files; the first is the entry point.
    pub files: Vec<SourceFile>,
    /// Standard input for the program.
    #[serde(default)]
    pub stdin: String,
}

impl ExecuteRequest {
    /// A single anonymous file at the latest runtime version.
    pub fn single(language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: "*".to_string(),
            files: vec![SourceFile::new("", content)],
            stdin: String::new(),
        }
    }

    /// Pin a runtime version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set standard input.
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }
}

/// Classified outcome of an execution.
///
/// A failing program is still a successful API call: check `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the program ran to a clean exit.
    pub success: bool,
    /// Program output, or compiler/runtime diagnostics on failure.
    #[serde(default)]
    pub output: String,
    /// Failure label, absent on success.
    #[serde(default)]
    pub error: Option<String>,
    /// The execution service's response, unmodified.
    #[serde(default)]
    pub raw: serde_json::Value,
}
