//! Error types for the format adapters
//!
//! Wraps encoder/decoder failures of each text format together with the
//! model errors raised while coercing decoded data or dispatching values.

use modelkit_core::ModelError;

/// Result alias for format adapter operations
pub type Result<T, E = FormatError> = std::result::Result<T, E>;

/// Errors raised by the format adapters
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// JSON encode or decode failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encode or decode failure
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML decode failure
    #[cfg(feature = "toml")]
    #[error("toml decode error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML encode failure
    #[cfg(feature = "toml")]
    #[error("toml encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Reading a stream or writing to one failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Extra fields were given for a document that is not a mapping
    #[error("cannot merge extra fields into a {found} document")]
    NotAMapping { found: String },

    /// Coercion or dispatch failed
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl FormatError {
    /// Create not-a-mapping error
    pub fn not_a_mapping(found: impl Into<String>) -> Self {
        Self::NotAMapping {
            found: found.into(),
        }
    }

    /// Model error behind this failure, if any
    #[must_use]
    pub fn as_model_error(&self) -> Option<&ModelError> {
        match self {
            Self::Model(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::ErrorKind;

    #[test]
    fn model_errors_pass_through() {
        let err: FormatError = ModelError::missing_required("Person", "name").into();
        assert_eq!(
            err.as_model_error().map(ModelError::kind),
            Some(ErrorKind::MissingRequiredField)
        );
        assert_eq!(err.to_string(), "Person: missing required field 'name'");
    }

    #[test]
    fn not_a_mapping_names_the_document() {
        let err = FormatError::not_a_mapping("list");
        assert!(err.to_string().contains("list"));
        assert!(err.as_model_error().is_none());
    }
}
