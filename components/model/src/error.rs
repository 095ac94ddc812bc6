//! Broker-assigned error codes and their structured mapping.

use num_enum::{FromPrimitive, IntoPrimitive};
use thiserror::Error;

/// Broker-global error codes relevant to the fetch path.
///
/// Codes the mapping does not recognize are preserved verbatim in
/// `Unknown`, so classification never loses the original value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(i16)]
pub enum ErrorCode {
    OffsetOutOfRange = 1,
    CorruptRecord = 2,
    UnknownTopicOrPartition = 3,
    InvalidFetchSize = 4,
    LeaderNotAvailable = 5,
    NotLeaderOrFollower = 6,
    RequestTimedOut = 7,
    BrokerNotAvailable = 8,
    ReplicaNotAvailable = 9,
    MessageTooLarge = 10,
    NetworkException = 13,
    TopicAuthorizationFailed = 29,
    UnsupportedVersion = 35,
    KafkaStorageError = 56,
    FetchSessionIdNotFound = 70,
    InvalidFetchSessionEpoch = 71,
    FencedLeaderEpoch = 74,
    UnknownLeaderEpoch = 77,
    OffsetNotAvailable = 78,
    PreferredLeaderNotAvailable = 80,

    #[num_enum(catch_all)]
    Unknown(i16),
}

/// A non-zero error code the broker attached to some scope of a response,
/// together with the optional diagnostic text it sent along.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("broker error {code:?}: {message}")]
pub struct BrokerError {
    code: ErrorCode,
    message: String,
}

impl BrokerError {
    /// Map a raw broker error code. Code 0 means success and maps to `None`.
    pub fn new(code: i16, message: impl Into<String>) -> Option<Self> {
        if code == 0 {
            return None;
        }
        Some(Self {
            code: ErrorCode::from(code),
            message: message.into(),
        })
    }

    /// The classifiable category of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
