use thiserror::Error;

use crate::core::AccountId;

/// Structural problems with user input. Numeric coercion never produces one of
/// these: blank or garbage numbers become zero before they reach the core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("duplicate account id {0}")]
    DuplicateAccount(AccountId),

    #[error("unknown account field `{0}`; expected initial, rate, months, contribution or goal")]
    UnknownField(String),

    #[error("account field `{0}` must be written as key=value")]
    MissingValue(String),

    #[error("account field `{0}` given more than once")]
    RepeatedField(String),

    #[error("account id must be a non-negative integer, got `{0}`")]
    InvalidId(String),

    #[error("invalid request payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Payload(e.to_string())
    }
}
