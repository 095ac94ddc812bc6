//! Wire codec of the broker protocol: lossless, versioned binary mapping
//! between in-memory request/response structures and broker wire bytes.
//! Pure data transformation; transports own framing and I/O.

pub mod buf;
pub mod error;
pub mod fetch;

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub use crate::buf::Encodable;
pub use crate::error::CodecError;

/// Numeric key of an API, written into request headers by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i16)]
pub enum ApiKey {
    Fetch = 1,
}
