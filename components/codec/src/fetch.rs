//! Versioned wire schema of the Fetch API.
//!
//! A single `Request`/`Response` type family carries all fields of the
//! supported versions; encoders and decoders gate each field on the
//! capabilities of the negotiated [`ApiVersion`], walking fields in the same
//! order on both passes. Version negotiation itself is the transport's
//! concern; this module only maps structures to bytes and back.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::trace;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::buf::{self, Encodable};
use crate::error::CodecError;

/// Replica id a consumer puts into a fetch request. Brokers use non-negative
/// ids for follower replication traffic.
pub const CONSUMER_REPLICA_ID: i32 = -1;

/// Leader epoch sentinel when the current leader epoch is unknown.
pub const NO_LEADER_EPOCH: i32 = -1;

/// Log start offset sentinel for consumers; only followers report theirs.
pub const NO_LOG_START_OFFSET: i64 = -1;

/// Session sentinels when incremental fetch sessions are not in use.
pub const NO_SESSION_ID: i32 = -1;
pub const NO_SESSION_EPOCH: i32 = -1;

/// Preferred read replica sentinel when the broker designates none.
pub const NO_PREFERRED_READ_REPLICA: i32 = -1;

/// Wire versions of the Fetch API this codec speaks.
///
/// V2 is the old flat encoding; V4 adds the isolation level and transactional
/// metadata; V11 adds fetch sessions, leader epochs, log start offsets and
/// rack awareness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive,
)]
#[repr(i16)]
pub enum ApiVersion {
    V2 = 2,
    V4 = 4,
    V11 = 11,
}

impl ApiVersion {
    pub fn supports_request_max_bytes(&self) -> bool {
        *self as i16 >= 3
    }

    pub fn supports_isolation_level(&self) -> bool {
        *self as i16 >= 4
    }

    pub fn supports_log_start_offset(&self) -> bool {
        *self as i16 >= 5
    }

    pub fn supports_sessions(&self) -> bool {
        *self as i16 >= 7
    }

    pub fn supports_leader_epoch(&self) -> bool {
        *self as i16 >= 9
    }

    pub fn supports_rack_id(&self) -> bool {
        *self as i16 >= 11
    }

    pub fn supports_preferred_read_replica(&self) -> bool {
        *self as i16 >= 11
    }
}

/// One fetch request against a single broker, possibly spanning many
/// topic-partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub version: ApiVersion,
    pub replica_id: i32,
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub max_bytes: i32,
    pub isolation_level: i8,
    pub session_id: i32,
    pub session_epoch: i32,
    pub topics: Vec<RequestTopic>,
    pub forgotten_topics: Vec<ForgottenTopic>,
    pub rack_id: String,
}

impl Request {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            replica_id: CONSUMER_REPLICA_ID,
            max_wait_ms: 0,
            min_bytes: 0,
            max_bytes: 0,
            isolation_level: 0,
            session_id: NO_SESSION_ID,
            session_epoch: NO_SESSION_EPOCH,
            topics: Vec::new(),
            forgotten_topics: Vec::new(),
            rack_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestTopic {
    pub topic: String,
    pub partitions: Vec<RequestPartition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestPartition {
    pub partition: i32,
    pub current_leader_epoch: i32,
    pub fetch_offset: i64,
    pub log_start_offset: i64,
    pub partition_max_bytes: i32,
}

/// Topic-partitions removed from an incremental fetch session.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgottenTopic {
    pub topic: String,
    pub partitions: Vec<i32>,
}

impl Encodable for Request {
    fn size(&self) -> i32 {
        let version = self.version;
        let mut n = 4 + 4 + 4;
        if version.supports_request_max_bytes() {
            n += 4;
        }
        if version.supports_isolation_level() {
            n += 1;
        }
        if version.supports_sessions() {
            n += 4 + 4;
        }
        n += 4;
        for topic in &self.topics {
            n += topic.size(version);
        }
        if version.supports_sessions() {
            n += 4;
            for topic in &self.forgotten_topics {
                n += topic.size();
            }
        }
        if version.supports_rack_id() {
            n += buf::size_of_str(&self.rack_id);
        }
        n
    }

    fn write_to(&self, buf: &mut BytesMut) {
        let version = self.version;
        buf.put_i32(self.replica_id);
        buf.put_i32(self.max_wait_ms);
        buf.put_i32(self.min_bytes);
        if version.supports_request_max_bytes() {
            buf.put_i32(self.max_bytes);
        }
        if version.supports_isolation_level() {
            buf.put_i8(self.isolation_level);
        }
        if version.supports_sessions() {
            buf.put_i32(self.session_id);
            buf.put_i32(self.session_epoch);
        }
        buf.put_i32(self.topics.len() as i32);
        for topic in &self.topics {
            topic.write_to(version, buf);
        }
        if version.supports_sessions() {
            buf.put_i32(self.forgotten_topics.len() as i32);
            for topic in &self.forgotten_topics {
                topic.write_to(buf);
            }
        }
        if version.supports_rack_id() {
            buf::write_str(buf, &self.rack_id);
        }
    }
}

impl RequestTopic {
    fn size(&self, version: ApiVersion) -> i32 {
        buf::size_of_str(&self.topic)
            + 4
            + self
                .partitions
                .iter()
                .map(|p| p.size(version))
                .sum::<i32>()
    }

    fn write_to(&self, version: ApiVersion, buf: &mut BytesMut) {
        buf::write_str(buf, &self.topic);
        buf.put_i32(self.partitions.len() as i32);
        for partition in &self.partitions {
            partition.write_to(version, buf);
        }
    }
}

impl RequestPartition {
    fn size(&self, version: ApiVersion) -> i32 {
        let mut n = 4 + 8 + 4;
        if version.supports_leader_epoch() {
            n += 4;
        }
        if version.supports_log_start_offset() {
            n += 8;
        }
        n
    }

    fn write_to(&self, version: ApiVersion, buf: &mut BytesMut) {
        buf.put_i32(self.partition);
        if version.supports_leader_epoch() {
            buf.put_i32(self.current_leader_epoch);
        }
        buf.put_i64(self.fetch_offset);
        if version.supports_log_start_offset() {
            buf.put_i64(self.log_start_offset);
        }
        buf.put_i32(self.partition_max_bytes);
    }
}

impl ForgottenTopic {
    fn size(&self) -> i32 {
        buf::size_of_str(&self.topic) + 4 + 4 * self.partitions.len() as i32
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf::write_str(buf, &self.topic);
        buf.put_i32(self.partitions.len() as i32);
        for partition in &self.partitions {
            buf.put_i32(*partition);
        }
    }
}

/// Decoded fetch response. Fields a version does not carry keep their
/// defaults: offsets default to zero, sentinels to `-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub version: ApiVersion,
    pub throttle_time_ms: i32,
    pub error_code: i16,
    pub session_id: i32,
    pub topics: Vec<ResponseTopic>,
}

impl Response {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            throttle_time_ms: 0,
            error_code: 0,
            session_id: 0,
            topics: Vec::new(),
        }
    }

    pub fn read_from(version: ApiVersion, src: &mut Bytes) -> Result<Response, CodecError> {
        trace!(
            "Decoding a Fetch[v{}] response of {} bytes",
            version as i16,
            src.remaining()
        );
        let mut response = Response::new(version);
        response.throttle_time_ms = buf::read_i32(src)?;
        if version.supports_sessions() {
            response.error_code = buf::read_i16(src)?;
            response.session_id = buf::read_i32(src)?;
        }
        let count = buf::read_array_count(src)?.max(0);
        let mut topics = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            topics.push(ResponseTopic::read_from(version, src)?);
        }
        response.topics = topics;
        Ok(response)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTopic {
    pub topic: String,
    pub partitions: Vec<ResponsePartition>,
}

impl ResponseTopic {
    fn read_from(version: ApiVersion, src: &mut Bytes) -> Result<ResponseTopic, CodecError> {
        let topic = buf::read_str(src)?;
        let count = buf::read_array_count(src)?.max(0);
        let mut partitions = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            partitions.push(ResponsePartition::read_from(version, src)?);
        }
        Ok(ResponseTopic { topic, partitions })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePartition {
    pub partition: i32,
    pub error_code: i16,
    pub high_watermark: i64,
    pub last_stable_offset: i64,
    pub log_start_offset: i64,
    pub aborted_transactions: Option<Vec<AbortedTransaction>>,
    pub preferred_read_replica: i32,
    pub records: Option<Bytes>,
}

impl Default for ResponsePartition {
    fn default() -> Self {
        Self {
            partition: 0,
            error_code: 0,
            high_watermark: 0,
            last_stable_offset: 0,
            log_start_offset: 0,
            aborted_transactions: None,
            preferred_read_replica: NO_PREFERRED_READ_REPLICA,
            records: None,
        }
    }
}

impl ResponsePartition {
    fn read_from(version: ApiVersion, src: &mut Bytes) -> Result<ResponsePartition, CodecError> {
        let mut partition = ResponsePartition {
            partition: buf::read_i32(src)?,
            error_code: buf::read_i16(src)?,
            high_watermark: buf::read_i64(src)?,
            ..Default::default()
        };
        if version.supports_isolation_level() {
            partition.last_stable_offset = buf::read_i64(src)?;
        }
        if version.supports_log_start_offset() {
            partition.log_start_offset = buf::read_i64(src)?;
        }
        if version.supports_isolation_level() {
            let count = buf::read_array_count(src)?;
            if count >= 0 {
                let mut aborted = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    aborted.push(AbortedTransaction {
                        producer_id: buf::read_i64(src)?,
                        first_offset: buf::read_i64(src)?,
                    });
                }
                partition.aborted_transactions = Some(aborted);
            }
        }
        if version.supports_preferred_read_replica() {
            partition.preferred_read_replica = buf::read_i32(src)?;
        }
        partition.records = buf::read_nullable_bytes(src)?;
        Ok(partition)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbortedTransaction {
    pub producer_id: i64,
    pub first_offset: i64,
}

impl Encodable for Response {
    fn size(&self) -> i32 {
        let version = self.version;
        let mut n = 4;
        if version.supports_sessions() {
            n += 2 + 4;
        }
        n += 4;
        for topic in &self.topics {
            n += topic.size(version);
        }
        n
    }

    fn write_to(&self, buf: &mut BytesMut) {
        let version = self.version;
        buf.put_i32(self.throttle_time_ms);
        if version.supports_sessions() {
            buf.put_i16(self.error_code);
            buf.put_i32(self.session_id);
        }
        buf.put_i32(self.topics.len() as i32);
        for topic in &self.topics {
            topic.write_to(version, buf);
        }
    }
}

impl ResponseTopic {
    fn size(&self, version: ApiVersion) -> i32 {
        buf::size_of_str(&self.topic)
            + 4
            + self
                .partitions
                .iter()
                .map(|p| p.size(version))
                .sum::<i32>()
    }

    fn write_to(&self, version: ApiVersion, buf: &mut BytesMut) {
        buf::write_str(buf, &self.topic);
        buf.put_i32(self.partitions.len() as i32);
        for partition in &self.partitions {
            partition.write_to(version, buf);
        }
    }
}

impl ResponsePartition {
    fn size(&self, version: ApiVersion) -> i32 {
        let mut n = 4 + 2 + 8;
        if version.supports_isolation_level() {
            n += 8;
        }
        if version.supports_log_start_offset() {
            n += 8;
        }
        if version.supports_isolation_level() {
            n += 4;
            if let Some(aborted) = &self.aborted_transactions {
                n += 16 * aborted.len() as i32;
            }
        }
        if version.supports_preferred_read_replica() {
            n += 4;
        }
        n + buf::size_of_nullable_bytes(self.records.as_ref())
    }

    fn write_to(&self, version: ApiVersion, buf: &mut BytesMut) {
        buf.put_i32(self.partition);
        buf.put_i16(self.error_code);
        buf.put_i64(self.high_watermark);
        if version.supports_isolation_level() {
            buf.put_i64(self.last_stable_offset);
        }
        if version.supports_log_start_offset() {
            buf.put_i64(self.log_start_offset);
        }
        if version.supports_isolation_level() {
            match &self.aborted_transactions {
                Some(aborted) => {
                    buf.put_i32(aborted.len() as i32);
                    for txn in aborted {
                        buf.put_i64(txn.producer_id);
                        buf.put_i64(txn.first_offset);
                    }
                }
                None => buf.put_i32(buf::NULL_LENGTH),
            }
        }
        if version.supports_preferred_read_replica() {
            buf.put_i32(self.preferred_read_replica);
        }
        buf::write_nullable_bytes(buf, self.records.as_ref());
    }
}
