use std::time::Duration;

use codec::fetch::ApiVersion;

/// Static configuration of a [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Negotiated Fetch API version to encode requests with. Negotiation
    /// itself happens outside this crate; callers set the outcome here.
    pub api_version: ApiVersion,

    /// Upper bound on any single round trip, independent of the per-request
    /// `max_wait`.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: ApiVersion::V11,
            request_timeout: Duration::from_secs(30),
        }
    }
}
