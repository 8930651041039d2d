// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::OperationError;

/// Uniform result of every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, String>,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            outputs: BTreeMap::new(),
        }
    }

    pub fn success_with_outputs<K, V>(
        message: impl Into<String>,
        outputs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            outputs: outputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::success(message)
        }
    }

    pub fn failure(err: impl std::fmt::Display) -> Self {
        let text = err.to_string();
        Self::failure_with_message(text.clone(), text)
    }

    pub fn failure_with_message(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            outputs: BTreeMap::new(),
        }
    }

    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }
}

impl From<OperationError> for Outcome {
    fn from(err: OperationError) -> Self {
        match &err {
            OperationError::ExpectationMismatch { expected, actual } => {
                Outcome::failure_with_message(
                    format!(
                        "permission check failed: expected allowed={} but got allowed={}",
                        expected, actual
                    ),
                    err.to_string(),
                )
            }
            OperationError::TimedOut {
                condition, status, ..
            }
            | OperationError::Cancelled {
                condition, status, ..
            } => Outcome::failure_with_message(
                format!("Condition {}={} not met", condition, status),
                err.to_string(),
            ),
            _ => Outcome::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serializes_without_error() {
        let outcome = Outcome::success_with_outputs("Created Pod/web", [("name", "web")]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["outputs"]["name"], "web");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_keeps_error_text() {
        let outcome = Outcome::failure("kind is required");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "kind is required");
        assert_eq!(outcome.error.as_deref(), Some("kind is required"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("outputs").is_none());
    }

    #[test]
    fn test_expectation_mismatch_message() {
        let outcome = Outcome::from(OperationError::ExpectationMismatch {
            expected: true,
            actual: false,
        });
        assert_eq!(
            outcome.message,
            "permission check failed: expected allowed=true but got allowed=false"
        );
        assert_eq!(outcome.error.as_deref(), Some("permission expectation not met"));
    }
}
