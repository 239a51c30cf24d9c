//! Error types for G-code transcoding.

use thiserror::Error;

/// Errors that can occur while transcoding a G-code document.
///
/// Every variant is terminal for the current file: no partial output is
/// produced once one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscodeError {
    /// A mandatory sentinel is absent from the input.
    #[error("missing metadata: no `{key}` found in the G-code comments")]
    MissingMetadata {
        /// Source token of the missing sentinel.
        key: &'static str,
    },

    /// A numeric or duration value could not be interpreted.
    #[error("cannot derive `{key}` from {value:?}: {reason}")]
    MetricDerivation {
        /// Source token of the offending setting.
        key: &'static str,
        /// Raw value as found in the file.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A mandatory firmware header field has no value.
    #[error("cannot encode header field `{field}`: no value available")]
    Encoding {
        /// Target token of the field.
        field: &'static str,
    },

    /// The header/body split point could not be located.
    #[error("structural boundary not found: {0}")]
    StructuralBoundary(String),
}

impl TranscodeError {
    /// Create a metric derivation error.
    pub fn derivation(
        key: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MetricDerivation {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for transcoding operations.
pub type Result<T> = std::result::Result<T, TranscodeError>;
