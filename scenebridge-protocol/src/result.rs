//! Command result envelope
//!
//! Every dispatched command resolves to exactly one [`CommandResult`],
//! serialized as `{"status": "success"|"error", ...}` with a timestamp
//! stamped by whichever component produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommandResult {
    /// Command completed
    Success {
        /// Command-specific payload
        result: Value,
        /// Per-step results, present only for `sequence`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        steps_results: Option<Vec<CommandResult>>,
        /// RFC 3339 time at which the result was produced
        timestamp: String,
    },
    /// Command failed
    Error {
        /// Human-readable failure cause
        error: String,
        /// RFC 3339 time at which the result was produced
        timestamp: String,
    },
}

impl CommandResult {
    /// Create a success result stamped with the current time
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
            steps_results: None,
            timestamp: now(),
        }
    }

    /// Create an error result stamped with the current time
    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            timestamp: now(),
        }
    }

    /// Create the aggregate result of a sequence
    ///
    /// The aggregate is always a success; individual step failures are only
    /// visible inside `steps_results`.
    pub fn sequence(steps_results: Vec<CommandResult>) -> Self {
        Self::Success {
            result: Value::String(format!(
                "Executed sequence with {} steps",
                steps_results.len()
            )),
            steps_results: Some(steps_results),
            timestamp: now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Success payload, if any
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Error { .. } => None,
        }
    }

    /// Error message, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error, .. } => Some(error),
        }
    }

    /// Per-step results of a sequence
    pub fn steps(&self) -> Option<&[CommandResult]> {
        match self {
            Self::Success {
                steps_results: Some(steps),
                ..
            } => Some(steps),
            _ => None,
        }
    }

    /// Compare two results ignoring their timestamps (recursively for steps)
    pub fn same_outcome(&self, other: &CommandResult) -> bool {
        match (self, other) {
            (
                Self::Success {
                    result: a,
                    steps_results: sa,
                    ..
                },
                Self::Success {
                    result: b,
                    steps_results: sb,
                    ..
                },
            ) => {
                a == b
                    && match (sa, sb) {
                        (None, None) => true,
                        (Some(sa), Some(sb)) => {
                            sa.len() == sb.len()
                                && sa.iter().zip(sb).all(|(x, y)| x.same_outcome(y))
                        }
                        _ => false,
                    }
            }
            (Self::Error { error: a, .. }, Self::Error { error: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Current time as an RFC 3339 string
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
