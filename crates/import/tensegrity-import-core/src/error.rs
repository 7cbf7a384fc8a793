//! Error types for the import engine.
//!
//! Every variant is terminal for the import that produced it: the orchestrator surfaces the
//! first error and no partial event stream is ever handed to a host.

use serde::{Deserialize, Serialize};

use crate::data::EntityKind;

/// Failure classification for one import call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ImportError {
    /// Malformed or unreadable JSON; `reason` is the decoder message verbatim.
    #[error("Failed to load JSON: {reason}")]
    Parse { reason: String },

    /// The input declared zero frames.
    #[error("No frames in JSON file")]
    EmptyAnimation,

    /// A matrix that is degenerate, reflected, or not orthogonal once scale is removed.
    #[error("Malformed transform for '{entity}' in frame {frame}: {reason}")]
    MalformedTransform {
        entity: String,
        frame: usize,
        reason: String,
    },

    /// A record lacks one of its required keys.
    #[error("Frame {frame}: {record} is missing required field '{field}'")]
    MissingField {
        frame: usize,
        record: String,
        field: String,
    },

    /// Two records of the same kind share a name inside one frame.
    #[error("Frame {frame}: duplicate {kind:?} named '{name}'")]
    DuplicateEntity {
        frame: usize,
        kind: EntityKind,
        name: String,
    },

    /// Out-of-range scalar input such as a non-positive frame rate.
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Internal contract breach between pipeline stages.
    #[error("Precondition violated: {reason}")]
    PreconditionViolated { reason: String },
}

impl ImportError {
    pub(crate) fn malformed_transform(
        entity: impl Into<String>,
        frame: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedTransform {
            entity: entity.into(),
            frame,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_field(frame: usize, record: impl Into<String>, field: &str) -> Self {
        Self::MissingField {
            frame,
            record: record.into(),
            field: field.to_string(),
        }
    }

    pub(crate) fn malformed_input(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    /// Get error category for logging/diagnostics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::EmptyAnimation => "empty",
            Self::MissingField { .. } | Self::DuplicateEntity { .. } => "schema",
            Self::MalformedTransform { .. } | Self::MalformedInput { .. } => "validation",
            Self::PreconditionViolated { .. } => "contract",
        }
    }

    /// True when the error stems from the caller's input rather than a bug in the pipeline.
    #[inline]
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::PreconditionViolated { .. })
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_keep_decoder_message() {
        let err = serde_json::from_str::<serde_json::Value>("{\"frames\": [").unwrap_err();
        let text = err.to_string();
        let mapped = ImportError::from(err);
        assert_eq!(mapped, ImportError::Parse { reason: text });
        assert_eq!(mapped.category(), "parse");
    }

    #[test]
    fn categories_group_variants() {
        assert_eq!(ImportError::EmptyAnimation.category(), "empty");
        assert_eq!(
            ImportError::missing_field(2, "joints[0]", "matrix").category(),
            "schema"
        );
        assert_eq!(ImportError::malformed_input("fps").category(), "validation");
        let contract = ImportError::PreconditionViolated {
            reason: "windows".into(),
        };
        assert_eq!(contract.category(), "contract");
        assert!(!contract.is_input_error());
        assert!(ImportError::EmptyAnimation.is_input_error());
    }

    #[test]
    fn display_names_the_offending_record() {
        let err = ImportError::missing_field(3, "intervals.pull[1]", "name");
        assert_eq!(
            err.to_string(),
            "Frame 3: intervals.pull[1] is missing required field 'name'"
        );
    }

    #[test]
    fn errors_round_trip_through_serde() {
        let err = ImportError::malformed_transform("J1", 1, "zero scale");
        let json = serde_json::to_string(&err).unwrap();
        let back: ImportError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
