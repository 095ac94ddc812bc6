//! Client side of the broker Fetch protocol.
//!
//! This crate builds versioned fetch requests, sends them through an
//! external round-trip transport, and normalizes the decoded responses. It
//! deliberately owns no connections: anything that can send one request and
//! receive its matching response implements [`RoundTrip`], and may
//! interleave many concurrent calls onto shared connections.

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod round_trip;

pub use crate::client::Client;
pub use crate::config::ClientConfig;
pub use crate::error::ClientError;
pub use crate::request::Request;
pub use crate::request::RequestExtension;
pub use crate::response::Response;
pub use crate::round_trip::RoundTrip;
