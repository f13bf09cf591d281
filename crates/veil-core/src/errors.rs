//! Structured error types shared across VEIL crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`VeilError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (lengths, parameter values, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Canonical error type for the VEIL engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum VeilError {
    /// Workload vector construction and validation errors.
    #[error("workload error: {0}")]
    Workload(ErrorInfo),
    /// Divergence computation errors (shape mismatches).
    #[error("divergence error: {0}")]
    Divergence(ErrorInfo),
    /// Uncertainty-radius estimation errors.
    #[error("estimator error: {0}")]
    Estimator(ErrorInfo),
    /// Random-restart search errors.
    #[error("search error: {0}")]
    Search(ErrorInfo),
    /// Serialization, persistence and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl VeilError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            VeilError::Workload(info)
            | VeilError::Divergence(info)
            | VeilError::Estimator(info)
            | VeilError::Search(info)
            | VeilError::Serde(info) => info,
        }
    }

    /// Builds the shape-mismatch error raised by divergence computations.
    pub fn shape_mismatch(left: usize, right: usize) -> Self {
        VeilError::Divergence(
            ErrorInfo::new("shape-mismatch", "vectors have unequal lengths")
                .with_context("left", left.to_string())
                .with_context("right", right.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_carries_both_lengths() {
        let err = VeilError::shape_mismatch(4, 3);
        let info = err.info();
        assert_eq!(info.code, "shape-mismatch");
        assert_eq!(info.context.get("left"), Some(&"4".to_string()));
        assert_eq!(info.context.get("right"), Some(&"3".to_string()));
    }

    #[test]
    fn errors_roundtrip_through_json() {
        let err = VeilError::shape_mismatch(4, 3);
        let text = serde_json::to_string(&err).unwrap();
        let back: VeilError = serde_json::from_str(&text).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn display_includes_context() {
        let info = ErrorInfo::new("bad-epsilon", "epsilon must be positive")
            .with_context("epsilon", "-1");
        let rendered = info.to_string();
        assert!(rendered.contains("bad-epsilon"));
        assert!(rendered.contains("epsilon=-1"));
    }
}
