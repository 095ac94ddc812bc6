use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CodecError {
    #[error("Need {needed} more bytes, only {remaining} left in the buffer")]
    Incomplete { needed: usize, remaining: usize },

    #[error("Bad message: {0}")]
    BadMessage(String),

    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Fetch API version {0} is not supported")]
    UnsupportedVersion(i16),
}
