//! Domain model of the fetch client: broker error codes, records and the
//! lazy record reader, and the caller-facing request/response shapes.

pub mod error;
pub mod fetch;
pub mod record;

pub use crate::error::BrokerError;
pub use crate::error::ErrorCode;
pub use crate::record::Header;
pub use crate::record::Record;
pub use crate::record::RecordReader;
