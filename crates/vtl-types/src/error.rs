use thiserror::Error;

/// Errors produced by payload type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid date in {field}: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("withdrawal date cannot be earlier than treatment date")]
    WithdrawalBeforeTreatment,

    #[error("payload not recognized as a treatment record")]
    UnrecognizedPayload,
}
