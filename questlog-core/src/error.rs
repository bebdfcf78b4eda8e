//! Error types for the rule layer.

use crate::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Unrecognized difficulty / task type / operator / category string.
    #[error("invalid {kind}: '{value}'")]
    InvalidEnum { kind: &'static str, value: String },

    /// Achievement condition parameter the evaluator does not know.
    /// Non-fatal: the evaluator skips the definition.
    #[error("unknown achievement parameter: '{0}'")]
    UnknownParameter(String),

    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition { from: TaskStatus, to: TaskStatus },

    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("invalid local datetime {0}")]
    InvalidDateTime(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_enum(kind: &'static str, value: &str) -> Self {
        Error::InvalidEnum {
            kind,
            value: value.to_string(),
        }
    }
}
