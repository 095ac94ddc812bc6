//! Caller-facing shapes of the Fetch and Multi-Fetch operations.

use std::collections::HashMap;
use std::time::Duration;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::BrokerError;
use crate::record::RecordReader;

/// Wait bound applied when a request leaves `max_wait` unset.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(500);

/// Read-visibility policy of a fetch.
///
/// `ReadCommitted` requires the broker connection to speak Fetch version 4
/// or above; the client rejects the combination rather than silently
/// downgrading it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum IsolationLevel {
    #[default]
    ReadUncommitted = 0,
    ReadCommitted = 1,
}

/// A request to retrieve records from one topic-partition at a given offset.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Address of the broker to send the request to.
    pub addr: String,

    /// Topic, partition, and offset to retrieve records from.
    pub topic: String,
    pub partition: i32,
    pub offset: i64,

    /// Size and time limits of the response returned by the broker.
    pub min_bytes: i64,
    pub max_bytes: i64,
    pub max_wait: Duration,

    pub isolation_level: IsolationLevel,
}

impl FetchRequest {
    pub fn effective_max_wait(&self) -> Duration {
        if self.max_wait > Duration::ZERO {
            self.max_wait
        } else {
            DEFAULT_MAX_WAIT
        }
    }
}

/// The broker's reply to a [`FetchRequest`].
#[derive(Debug)]
pub struct FetchResponse {
    /// How long the broker throttled the request.
    pub throttle: Duration,

    /// Echoed from the request.
    pub topic: String,
    pub partition: i32,

    /// Partition layout as reported by the broker. Fields the negotiated
    /// wire version does not carry are zero.
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,

    /// Error the broker attached to this partition, or to the response as a
    /// whole when no partition-level code was set. `None` on success;
    /// callers must check it before consuming `records`.
    pub error: Option<BrokerError>,

    /// The records returned for the partition; an empty reader when the
    /// broker returned none. The caller owns its lifecycle.
    ///
    /// The broker may return batches starting before the requested offset;
    /// skipping those records is the caller's responsibility.
    pub records: RecordReader,
}

/// One per-partition entry inside a [`MultiFetchRequest`].
#[derive(Debug, Clone, Default)]
pub struct FetchPartitionRequest {
    pub partition: i32,
    pub offset: i64,

    /// Byte bound for this partition; falls back to the request-wide
    /// `max_bytes` when zero.
    pub max_bytes: i64,
}

/// Per-partition slice of a [`MultiFetchResponse`].
#[derive(Debug)]
pub struct FetchPartitionResponse {
    pub partition: i32,
    pub error: Option<BrokerError>,
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,
    pub records: RecordReader,
}

/// A batched fetch across many topic-partitions on a single broker.
///
/// The broker applies `min_bytes`/`max_bytes`/`max_wait` to the response as
/// a whole; this is one wire request, not parallel independent fetches.
#[derive(Debug, Clone, Default)]
pub struct MultiFetchRequest {
    /// Address of the broker to send the request to.
    pub addr: String,

    /// Partition specs to fetch, keyed by topic name.
    pub requests: HashMap<String, Vec<FetchPartitionRequest>>,

    /// Size and time limits of the response returned by the broker.
    pub min_bytes: i64,
    pub max_bytes: i64,
    pub max_wait: Duration,

    pub isolation_level: IsolationLevel,
}

impl MultiFetchRequest {
    pub fn effective_max_wait(&self) -> Duration {
        if self.max_wait > Duration::ZERO {
            self.max_wait
        } else {
            DEFAULT_MAX_WAIT
        }
    }
}

/// The broker's reply to a [`MultiFetchRequest`].
#[derive(Debug, Default)]
pub struct MultiFetchResponse {
    /// How long the broker throttled the request.
    pub throttle: Duration,

    /// Per-partition results keyed by topic name, in the broker's decoded
    /// partition order. Empty when the broker returned no topics. Each
    /// entry carries its own independent error state.
    pub responses: HashMap<String, Vec<FetchPartitionResponse>>,

    /// Error the broker attached to the response as a whole. Does not leak
    /// into unaffected partitions.
    pub error: Option<BrokerError>,
}
