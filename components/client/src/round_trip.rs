use crate::error::ClientError;
use crate::request::Request;
use crate::response::Response;

/// Contract between the fetch operations and the underlying transport.
///
/// One call is one request sent and its matching response received over
/// whatever connection management the implementor provides. Implementations
/// must be safe for concurrent invocation and must honor the request's
/// timeout by aborting the wait and returning promptly; the client does not
/// retry and surfaces transport errors unchanged.
#[allow(async_fn_in_trait)]
pub trait RoundTrip {
    async fn round_trip(&self, addr: &str, request: Request) -> Result<Response, ClientError>;
}
