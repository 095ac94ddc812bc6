use codec::fetch;
use codec::ApiKey;

/// Decoded response handed back by the round-trip transport, tagged by the
/// API it answers. Callers narrow to the variant they expect and treat any
/// other as a protocol error rather than trusting an unchecked cast.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Fetch(fetch::Response),
}

impl Response {
    pub fn api_key(&self) -> ApiKey {
        match self {
            Response::Fetch(_) => ApiKey::Fetch,
        }
    }
}
