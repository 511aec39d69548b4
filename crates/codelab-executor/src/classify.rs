//! Classification of remote execution results.
//!
//! The remote service reports compile and run stages separately, with exit
//! codes, signals and captured streams. Callers get one of five outcomes,
//! chosen by the first matching rule in [`RULES`]:
//!
//! | # | kind            | when                                           |
//! |---|-----------------|------------------------------------------------|
//! | 1 | `RemoteError`   | the remote returned an error body              |
//! | 2 | `CompileError`  | compile exit code ≠ 0 and compile stderr set   |
//! | 3 | `Timeout`       | run stage ended by SIGKILL or SIGTERM          |
//! | 4 | `RuntimeError`  | run exit code ≠ 0 and run stderr set           |
//! | 5 | `Success`       | anything else                                  |

use serde::Serialize;

use crate::types::{ExecutionResult, NormalizedOutcome};

/// Error text when the remote error body has no message.
pub const EXECUTION_FAILED: &str = "Execution failed";
/// Error text for compile failures.
pub const COMPILATION_ERROR: &str = "Compilation Error";
/// Error text for killed processes.
pub const TIMEOUT_DETECTED: &str = "Timeout or Infinite Loop Detected";
/// Error text for non-zero exits with stderr.
pub const RUNTIME_ERROR: &str = "Runtime Error";
/// Appended to stdout when the run stage was killed.
pub const KILLED_SUFFIX: &str = "\n[Process killed due to timeout]";

/// Outcome category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    RemoteError,
    CompileError,
    Timeout,
    RuntimeError,
    Success,
}

/// One row of the decision table.
pub struct Rule {
    /// Category this rule assigns.
    pub kind: OutcomeKind,
    matches: fn(&ExecutionResult) -> bool,
    build: fn(&ExecutionResult) -> NormalizedOutcome,
}

impl Rule {
    /// Whether this rule applies to `result`.
    pub fn matches(&self, result: &ExecutionResult) -> bool {
        (self.matches)(result)
    }

    /// Build the outcome for a result this rule matched.
    pub fn build(&self, result: &ExecutionResult) -> NormalizedOutcome {
        (self.build)(result)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

/// The ordered decision table. First match wins; the last rule always matches.
pub static RULES: [Rule; 5] = [
    Rule {
        kind: OutcomeKind::RemoteError,
        matches: |r| r.error.is_some(),
        build: |r| {
            NormalizedOutcome::failure(
                r.error_message().unwrap_or(EXECUTION_FAILED),
                "",
                r.error.clone().unwrap_or_default(),
            )
        },
    },
    Rule {
        kind: OutcomeKind::CompileError,
        matches: |r| {
            r.compile
                .as_ref()
                .is_some_and(|c| c.exited_non_zero() && !c.stderr.is_empty())
        },
        build: |r| {
            let stderr = r.compile.as_ref().map(|c| c.stderr.as_str()).unwrap_or("");
            NormalizedOutcome::failure(COMPILATION_ERROR, stderr, r.to_raw())
        },
    },
    Rule {
        kind: OutcomeKind::Timeout,
        matches: |r| r.run.as_ref().is_some_and(|s| s.was_killed()),
        build: |r| {
            let stdout = r.run.as_ref().map(|s| s.stdout.as_str()).unwrap_or("");
            NormalizedOutcome::failure(
                TIMEOUT_DETECTED,
                format!("{stdout}{KILLED_SUFFIX}"),
                r.to_raw(),
            )
        },
    },
    Rule {
        kind: OutcomeKind::RuntimeError,
        matches: |r| {
            r.run
                .as_ref()
                .is_some_and(|s| s.exited_non_zero() && !s.stderr.is_empty())
        },
        build: |r| {
            let stderr = r.run.as_ref().map(|s| s.stderr.as_str()).unwrap_or("");
            NormalizedOutcome::failure(RUNTIME_ERROR, stderr, r.to_raw())
        },
    },
    Rule {
        kind: OutcomeKind::Success,
        matches: |_| true,
        build: |r| {
            let stdout = r.run.as_ref().map(|s| s.stdout.as_str()).unwrap_or("");
            NormalizedOutcome::success(stdout, r.to_raw())
        },
    },
];

/// A classified result.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Which rule fired.
    pub kind: OutcomeKind,
    /// The outcome to return to the caller.
    pub outcome: NormalizedOutcome,
}

/// The first rule in [`RULES`] that matches `result`.
pub fn matching_rule(result: &ExecutionResult) -> &'static Rule {
    // The final rule matches unconditionally.
    RULES
        .iter()
        .find(|rule| rule.matches(result))
        .unwrap_or(&RULES[RULES.len() - 1])
}

/// Classify a remote result, keeping the rule kind.
pub fn classify_with_kind(result: &ExecutionResult) -> Classification {
    let rule = matching_rule(result);
    Classification {
        kind: rule.kind,
        outcome: rule.build(result),
    }
}

/// Classify a remote result into the caller-facing outcome.
pub fn classify(result: &ExecutionResult) -> NormalizedOutcome {
    classify_with_kind(result).outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Signal, StageResult};
    use serde_json::json;

    fn stage(stdout: &str, stderr: &str, code: Option<i64>) -> StageResult {
        StageResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            code,
            ..Default::default()
        }
    }

    fn run_only(run: StageResult) -> ExecutionResult {
        ExecutionResult {
            run: Some(run),
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let kinds: Vec<OutcomeKind> = RULES.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OutcomeKind::RemoteError,
                OutcomeKind::CompileError,
                OutcomeKind::Timeout,
                OutcomeKind::RuntimeError,
                OutcomeKind::Success,
            ]
        );
    }

    #[test]
    fn test_remote_error_wins_over_everything() {
        let mut killed = stage("partial", "boom", Some(1));
        killed.signal = Some(Signal::Number(9));
        let result = ExecutionResult {
            error: Some(json!({"message": "python3-99 runtime is unknown"})),
            compile: Some(stage("", "syntax error", Some(1))),
            run: Some(killed),
            ..Default::default()
        };

        let classified = classify_with_kind(&result);
        assert_eq!(classified.kind, OutcomeKind::RemoteError);
        assert!(!classified.outcome.success);
        assert_eq!(
            classified.outcome.error.as_deref(),
            Some("python3-99 runtime is unknown")
        );
        assert_eq!(classified.outcome.output, "");
        assert_eq!(
            classified.outcome.raw,
            json!({"message": "python3-99 runtime is unknown"})
        );
    }

    #[test]
    fn test_remote_error_without_message() {
        let result = ExecutionResult::remote_error(json!("Bad Gateway"));
        let outcome = classify(&result);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some(EXECUTION_FAILED));
    }

    #[test]
    fn test_compile_error() {
        let result = ExecutionResult {
            compile: Some(stage("", "syntax error", Some(1))),
            ..Default::default()
        };

        let outcome = classify(&result);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Compilation Error"));
        assert_eq!(outcome.output, "syntax error");
    }

    #[test]
    fn test_compile_non_zero_without_stderr_falls_through() {
        let result = ExecutionResult {
            compile: Some(stage("", "", Some(1))),
            run: Some(stage("ran anyway", "", Some(0))),
            ..Default::default()
        };
        assert_eq!(classify_with_kind(&result).kind, OutcomeKind::Success);
    }

    #[test]
    fn test_compile_warnings_with_zero_exit_are_not_errors() {
        let result = ExecutionResult {
            compile: Some(stage("", "warning: unused variable", Some(0))),
            run: Some(stage("ok", "", Some(0))),
            ..Default::default()
        };
        let outcome = classify(&result);
        assert!(outcome.success);
        assert_eq!(outcome.output, "ok");
    }

    #[test]
    fn test_kill_signal_is_timeout() {
        let mut run = stage("1\n2\n3", "", None);
        run.signal = Some(Signal::Number(9));

        let outcome = classify(&run_only(run));
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Timeout or Infinite Loop Detected")
        );
        assert!(outcome.output.ends_with("[Process killed due to timeout]"));
        assert_eq!(outcome.output, "1\n2\n3\n[Process killed due to timeout]");
    }

    #[test]
    fn test_named_term_signal_is_timeout() {
        let mut run = stage("", "Terminated", Some(143));
        run.signal = Some(Signal::Name("SIGTERM".to_string()));
        assert_eq!(classify_with_kind(&run_only(run)).kind, OutcomeKind::Timeout);
    }

    #[test]
    fn test_other_signals_are_not_timeouts() {
        let mut run = stage("", "Segmentation fault", Some(139));
        run.signal = Some(Signal::Name("SIGSEGV".to_string()));
        assert_eq!(
            classify_with_kind(&run_only(run)).kind,
            OutcomeKind::RuntimeError
        );
    }

    #[test]
    fn test_runtime_error() {
        let run = stage("", "ZeroDivisionError: division by zero", Some(1));
        let outcome = classify(&run_only(run));
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Runtime Error"));
        assert_eq!(outcome.output, "ZeroDivisionError: division by zero");
    }

    #[test]
    fn test_non_zero_exit_without_stderr_is_success() {
        let outcome = classify(&run_only(stage("partial", "", Some(3))));
        assert!(outcome.success);
        assert_eq!(outcome.output, "partial");
    }

    #[test]
    fn test_stderr_ignored_on_zero_exit() {
        let outcome = classify(&run_only(stage("42", "DeprecationWarning", Some(0))));
        assert!(outcome.success);
        assert_eq!(outcome.output, "42");
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_empty_stdout_is_valid_success() {
        let outcome = classify(&run_only(stage("", "", Some(0))));
        assert!(outcome.success);
        assert_eq!(outcome.output, "");
    }

    #[test]
    fn test_missing_run_stage_is_empty_success() {
        let outcome = classify(&ExecutionResult::default());
        assert!(outcome.success);
        assert_eq!(outcome.output, "");
    }

    #[test]
    fn test_raw_carries_remote_payload() {
        let payload = json!({
            "language": "python",
            "version": "3.10.0",
            "run": {"stdout": "42", "stderr": "", "code": 0, "signal": null, "output": "42"}
        });
        let result: ExecutionResult = serde_json::from_value(payload).unwrap();
        let outcome = classify(&result);
        assert_eq!(outcome.raw["language"], "python");
        assert_eq!(outcome.raw["run"]["stdout"], "42");
    }

    #[test]
    fn test_every_rule_fires_for_some_input() {
        let mut killed = stage("", "", None);
        killed.signal = Some(Signal::Number(15));

        let samples = [
            ExecutionResult::remote_error(json!({})),
            ExecutionResult {
                compile: Some(stage("", "e", Some(2))),
                ..Default::default()
            },
            run_only(killed),
            run_only(stage("", "e", Some(2))),
            run_only(stage("ok", "", Some(0))),
        ];

        for (rule, sample) in RULES.iter().zip(samples.iter()) {
            assert_eq!(matching_rule(sample).kind, rule.kind);
        }
    }
}
