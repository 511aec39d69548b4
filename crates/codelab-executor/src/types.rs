//! Wire types shared between the remote execution service and the API.
//!
//! - [`Submission`] is what a caller asks us to run (request-scoped).
//! - [`RuntimeDescriptor`] is one entry of the remote runtime registry.
//! - [`ExecutionResult`] is the remote service's answer, as received.
//! - [`NormalizedOutcome`] is what the API hands back after classification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SubmissionError;

/// Default cap on the combined size of all submitted source files (50 KiB).
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 50 * 1024;

/// Version selector meaning "latest available".
pub const LATEST_VERSION: &str = "*";

fn latest_version() -> String {
    LATEST_VERSION.to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────────────────────────

/// A single source file in a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name; the remote service picks one when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// File contents.
    #[serde(default)]
    pub content: String,
}

impl SourceFile {
    /// Create a named source file.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A request to run code on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Language name as supplied by the caller (mapped before dispatch).
    pub language: String,

    /// Version selector, `"*"` for latest.
    #[serde(default = "latest_version")]
    pub version: String,

    /// Source files, first one is the entry point.
    pub files: Vec<SourceFile>,

    /// Data fed to the program's standard input.
    #[serde(default)]
    pub stdin: String,

    /// Command-line arguments for the program.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Compile stage time limit in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_timeout: Option<u64>,

    /// Run stage time limit in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout: Option<u64>,

    /// Compile stage memory limit in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_memory_limit: Option<i64>,

    /// Run stage memory limit in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_memory_limit: Option<i64>,
}

impl Submission {
    /// Create a submission for the latest version of a language.
    pub fn new(language: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            language: language.into(),
            version: latest_version(),
            files,
            stdin: String::new(),
            args: Vec::new(),
            compile_timeout: None,
            run_timeout: None,
            compile_memory_limit: None,
            run_memory_limit: None,
        }
    }

    /// Set the version selector.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set standard input.
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Combined byte length of every file's contents.
    pub fn source_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }

    /// Check the combined source size. Language and version are left for
    /// the remote service to judge.
    pub fn validate(&self, max_source_bytes: usize) -> Result<(), SubmissionError> {
        let size = self.source_bytes();
        if size > max_source_bytes {
            return Err(SubmissionError::TooLarge {
                size,
                limit: max_source_bytes,
            });
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime Registry
// ─────────────────────────────────────────────────────────────────────────────

/// A language/version pair the remote service advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    /// Remote language identifier.
    pub language: String,
    /// Concrete version string.
    pub version: String,
    /// Alternative names accepted for this language.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RuntimeDescriptor {
    /// Create a descriptor.
    pub fn new(
        language: impl Into<String>,
        version: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is this runtime's language or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.language == name || self.aliases.iter().any(|a| a == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote Result
// ─────────────────────────────────────────────────────────────────────────────

/// Signal that terminated a stage, as a number or a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signal {
    /// Numeric signal (e.g. `9`).
    Number(i32),
    /// Named signal (e.g. `"SIGKILL"`).
    Name(String),
}

/// SIGKILL.
pub const SIGKILL: i32 = 9;
/// SIGTERM.
pub const SIGTERM: i32 = 15;

impl Signal {
    /// Whether this is the kill or terminate signal.
    pub fn is_kill_or_term(&self) -> bool {
        match self {
            Signal::Number(n) => *n == SIGKILL || *n == SIGTERM,
            Signal::Name(name) => {
                let name = name.trim().to_ascii_uppercase();
                let name = name.strip_prefix("SIG").unwrap_or(&name);
                matches!(name, "KILL" | "TERM" | "9" | "15")
            }
        }
    }
}

/// One stage (compile or run) of a remote execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Standard output.
    #[serde(default)]
    pub stdout: String,
    /// Standard error.
    #[serde(default)]
    pub stderr: String,
    /// Exit code; absent when the process was killed.
    #[serde(default, alias = "exit_code", alias = "exitCode")]
    pub code: Option<i64>,
    /// Terminating signal, if any.
    #[serde(default)]
    pub signal: Option<Signal>,
    /// Remaining fields the remote sent (interleaved output, timings, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StageResult {
    /// Whether the stage exited with something other than 0.
    ///
    /// A missing exit code counts as non-zero.
    pub fn exited_non_zero(&self) -> bool {
        self.code != Some(0)
    }

    /// Whether the stage was ended by SIGKILL or SIGTERM.
    pub fn was_killed(&self) -> bool {
        self.signal.as_ref().is_some_and(Signal::is_kill_or_term)
    }
}

/// The remote service's answer to an execute call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Error body when the remote rejected the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Compile stage, for compiled languages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<StageResult>,
    /// Run stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<StageResult>,
    /// Remaining top-level fields (language, version, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionResult {
    /// Wrap a remote error body.
    pub fn remote_error(body: Value) -> Self {
        Self {
            error: Some(body),
            ..Default::default()
        }
    }

    /// The remote error's `message` field, if there is one.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    }

    /// The payload as JSON, for diagnostics.
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalized Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// The classified result returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOutcome {
    /// Whether the program ran to completion without a reported failure.
    pub success: bool,
    /// Program output, or the diagnostic text for failures.
    pub output: String,
    /// Failure category, `None` on success.
    pub error: Option<String>,
    /// The remote payload for diagnostics.
    pub raw: Value,
}

impl NormalizedOutcome {
    /// A successful outcome.
    pub fn success(output: impl Into<String>, raw: Value) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            raw,
        }
    }

    /// A failed outcome.
    pub fn failure(error: impl Into<String>, output: impl Into<String>, raw: Value) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
            raw,
        }
    }
}
