use std::fmt::{self, Display};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use codec::fetch;
use codec::{ApiKey, Encodable};

/// One request handed to the round-trip transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Cancellation bound of the round trip. Transports must give up and
    /// return promptly once it elapses.
    pub timeout: Duration,

    pub extension: RequestExtension,
}

/// Operation-specific body of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestExtension {
    Fetch(fetch::Request),
}

impl Request {
    pub fn fetch(timeout: Duration, request: fetch::Request) -> Self {
        Self {
            timeout,
            extension: RequestExtension::Fetch(request),
        }
    }

    pub fn api_key(&self) -> ApiKey {
        match &self.extension {
            RequestExtension::Fetch(_) => ApiKey::Fetch,
        }
    }

    pub fn api_version(&self) -> fetch::ApiVersion {
        match &self.extension {
            RequestExtension::Fetch(request) => request.version,
        }
    }
}

impl From<&Request> for Bytes {
    fn from(req: &Request) -> Self {
        match &req.extension {
            RequestExtension::Fetch(request) => {
                let mut buf = BytesMut::with_capacity(request.size() as usize);
                request.write_to(&mut buf);
                buf.freeze()
            }
        }
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.extension {
            RequestExtension::Fetch(request) => {
                write!(f, "Fetch[v{}]", i16::from(request.version))
            }
        }
    }
}
