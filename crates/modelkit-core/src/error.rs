//! Error types for modelkit core
//!
//! Covers the failure taxonomy of model construction and conversion:
//! - Missing required fields at construction
//! - Validator and typed container rejections
//! - Coercion failures for child, sequence, set and mapping values
//! - Strict-mode extra keys and unknown enum values
//! - Declaration-time problems with model and enum types

/// Result alias used throughout the crate
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Main model error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A required field received no value and has no default
    #[error("{model}: missing required field '{field}'")]
    MissingRequiredField { model: String, field: String },

    /// A validator or typed container rejected a value
    #[error("{context}: expected {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    /// A raw value could not be coerced into the target type
    #[error("failed to convert value ({value}) to {target} ... [original error message: {message}]")]
    Conversion {
        value: String,
        target: String,
        message: String,
    },

    /// Strict-mode coercion found input keys with no matching field
    #[error("{model}: extra keys (strict mode): {keys:?}")]
    ExtraKeys { model: String, keys: Vec<String> },

    /// No enum member matches the raw value
    #[error("{value} is not a valid {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },

    /// Keyword argument or field name that the model does not declare
    #[error("{model}: unknown field '{field}'")]
    UnknownField { model: String, field: String },

    /// Attempt to assign a field of an immutable instance
    #[error("{model}: cannot assign field '{field}' of an immutable instance")]
    FrozenInstance { model: String, field: String },

    /// Deferred model reference has no registered type
    #[error("unresolved model type: {0}")]
    UnresolvedType(String),

    /// Date/time formatter pattern could not be used
    #[error("invalid formatter '{formatter}': {reason}")]
    InvalidFormatter { formatter: String, reason: String },

    /// Typed mapping `add` without an explicit key or key field
    #[error("no key set in instance or provided in call")]
    MissingKey,

    /// Typed sequence position past the end
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Model or enum declaration is invalid
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),
}

/// Coarse classification of [`ModelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingRequiredField,
    TypeMismatch,
    Conversion,
    ExtraKeys,
    UnknownEnumValue,
    UnknownField,
    FrozenInstance,
    UnresolvedType,
    InvalidFormatter,
    MissingKey,
    IndexOutOfRange,
    Declaration,
}

impl ModelError {
    /// Create missing required field error
    pub fn missing_required(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Create type mismatch error
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create conversion error
    pub fn conversion(
        value: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            value: value.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Get the error classification
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::ExtraKeys { .. } => ErrorKind::ExtraKeys,
            Self::UnknownEnumValue { .. } => ErrorKind::UnknownEnumValue,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::FrozenInstance { .. } => ErrorKind::FrozenInstance,
            Self::UnresolvedType(_) => ErrorKind::UnresolvedType,
            Self::InvalidFormatter { .. } => ErrorKind::InvalidFormatter,
            Self::MissingKey => ErrorKind::MissingKey,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::Declaration(_) => ErrorKind::Declaration,
        }
    }

    /// Check if error belongs to the value-error class
    ///
    /// Value-class failures raised while coercing a nested value are wrapped
    /// into [`ModelError::Conversion`] by the container converters; the
    /// type-class failures propagate unchanged.
    #[inline]
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::Conversion { .. } | Self::ExtraKeys { .. } | Self::UnknownEnumValue { .. }
        )
    }
}

/// Errors in model and enum declarations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclarationError {
    /// Two fields share a name
    #[error("{model}: duplicate field name '{field}'")]
    DuplicateField { model: String, field: String },

    /// Two fields resolve to the same external key
    #[error("{model}: fields '{first}' and '{second}' both use key '{key}'")]
    DuplicateKey {
        model: String,
        key: String,
        first: String,
        second: String,
    },

    /// Mapping field without a child key
    #[error("{model}: mapping field '{field}' needs a child key")]
    EmptyChildKey { model: String, field: String },

    /// Enum declares the same member name or value twice
    #[error("{enum_name}: duplicate member {member}")]
    DuplicateMember { enum_name: String, member: String },

    /// Regex field pattern does not compile
    #[error("field '{field}': invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    /// Type name is empty
    #[error("type name must not be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_classification() {
        assert!(ModelError::conversion("x", "int", "bad").is_value_error());
        assert!(ModelError::ExtraKeys {
            model: "m".into(),
            keys: vec!["k".into()]
        }
        .is_value_error());
        assert!(!ModelError::type_mismatch("m.f", "int", "string").is_value_error());
        assert!(!ModelError::missing_required("m", "f").is_value_error());
    }

    #[test]
    fn conversion_message_carries_original() {
        let err = ModelError::conversion("{'a': 1}", "Person", "missing required field");
        let msg = err.to_string();
        assert!(msg.contains("{'a': 1}"));
        assert!(msg.contains("Person"));
        assert!(msg.contains("missing required field"));
    }

    #[test]
    fn declaration_converts() {
        let err: ModelError = DeclarationError::EmptyName.into();
        assert_eq!(err.kind(), ErrorKind::Declaration);
    }
}
