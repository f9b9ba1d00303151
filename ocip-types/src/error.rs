//! Entity-level errors.

use thiserror::Error;

/// An error raised while converting between instances, typed entities, and
/// dict projections. The client crate lifts these into its unified taxonomy.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EntityError {
    #[error("`{tag}` has no field `{field}`")]
    UnknownField { tag: String, field: String },

    #[error("field `{field}` expected {expected}, found {found}")]
    Mismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected a `{expected}` instance, found `{found}`")]
    TagMismatch { expected: String, found: String },

    #[error("field `{field}`: {message}")]
    Invalid { field: String, message: String },
}

impl EntityError {
    pub(crate) fn mismatch(field: &str, expected: &'static str, found: &'static str) -> Self {
        Self::Mismatch {
            field: field.to_owned(),
            expected,
            found,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}
