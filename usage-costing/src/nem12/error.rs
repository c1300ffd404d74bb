/// Failure to decode a single NEM12 row into a typed record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("missing mandatory field {field}")]
    MissingField { field: &'static str },
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("expected {expected} interval values, found {found}")]
    NotEnoughValues { expected: usize, found: usize },
}

/// A 400 record addressed sub-intervals the open 300 record does not have.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("interval event range {start}..={end} is outside 1..={available}")]
pub struct EventRangeError {
    pub start: usize,
    pub end: usize,
    pub available: usize,
}
