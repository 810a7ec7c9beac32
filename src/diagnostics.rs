//! Non-fatal diagnostic events raised while scoring a request.
//!
//! Every degradation path in the pipeline (failed probe, unseen category,
//! missing column) substitutes a default value and records one of these
//! events instead of returning an error.

use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A recoverable condition observed during feature extraction or alignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A network probe failed or timed out and resolved to its fail-closed value.
    ProbeFailed { probe: String, reason: String },
    /// A categorical value was not seen at training time.
    UnseenCategory { column: String, value: String },
    /// A categorical column was absent from the input.
    MissingCategory { column: String },
    /// An expected model column was absent and was filled with the default.
    MissingColumn { column: String },
    /// A field could not be interpreted and was replaced with its default.
    FieldUnparseable { field: String, value: String },
}

impl Diagnostic {
    /// Short machine-friendly name, used as a metrics key.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::ProbeFailed { .. } => "probe_failed",
            Diagnostic::UnseenCategory { .. } => "unseen_category",
            Diagnostic::MissingCategory { .. } => "missing_category",
            Diagnostic::MissingColumn { .. } => "missing_column",
            Diagnostic::FieldUnparseable { .. } => "field_unparseable",
        }
    }

    /// Emit the event through `tracing`.
    pub fn emit(&self, domain: &str) {
        match self {
            Diagnostic::ProbeFailed { probe, reason } => {
                warn!(domain, probe = %probe, reason = %reason, "Probe failed, using fail-closed value");
            }
            Diagnostic::UnseenCategory { column, value } => {
                warn!(domain, column = %column, value = %value, "Unseen category, using sentinel code");
            }
            Diagnostic::MissingCategory { column } => {
                warn!(domain, column = %column, "Categorical column missing, using sentinel code");
            }
            Diagnostic::MissingColumn { column } => {
                warn!(domain, column = %column, "Model column missing, filled with default");
            }
            Diagnostic::FieldUnparseable { field, value } => {
                warn!(domain, field = %field, value = %value, "Field unparseable, using default");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ProbeFailed { probe, reason } => write!(f, "probe {probe} failed: {reason}"),
            Diagnostic::UnseenCategory { column, value } => {
                write!(f, "unseen category {value:?} in column {column}")
            }
            Diagnostic::MissingCategory { column } => write!(f, "categorical column {column} missing"),
            Diagnostic::MissingColumn { column } => write!(f, "column {column} missing"),
            Diagnostic::FieldUnparseable { field, value } => {
                write!(f, "field {field} has unparseable value {value:?}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_display() {
        let diag = Diagnostic::UnseenCategory {
            column: "Account_Type".to_string(),
            value: "Crypto".to_string(),
        };
        assert_eq!(diag.kind(), "unseen_category");
        assert_eq!(diag.to_string(), "unseen category \"Crypto\" in column Account_Type");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let diag = Diagnostic::MissingColumn {
            column: "Account_Balance".to_string(),
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "missing_column");
        assert_eq!(json["column"], "Account_Balance");
    }
}
