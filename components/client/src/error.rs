use std::time::Duration;

use codec::error::CodecError;
use codec::fetch::ApiVersion;
use model::fetch::IsolationLevel;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClientError {
    #[error("Bad address `{0}`")]
    BadAddress(String),

    #[error("Connection to `{0}` is refused")]
    ConnectionRefused(String),

    #[error("Failed to establish TCP connection. Cause: `{0}`")]
    ConnectFailure(String),

    #[error("Channel `{0}` is half closed")]
    ChannelClosing(String),

    #[error("Client fails to receive response from broker within {timeout:?}")]
    RpcTimeout { timeout: Duration },

    #[error("No topic in the request or the response")]
    NoTopic,

    #[error("No partition under the topic in the response")]
    NoPartition,

    #[error("Broker sent a response that does not match the request")]
    UnexpectedResponse,

    #[error("{0:?} requires Fetch version 4 or above, configured version is {1:?}")]
    UnsupportedIsolationLevel(IsolationLevel, ApiVersion),

    #[error("Failed to decode response. Cause: {0}")]
    Codec(#[from] CodecError),

    #[error("Client internal error")]
    ClientInternal,
}
