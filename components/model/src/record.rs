//! Records and the lazy, single-pass reader over a fetched batch.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use codec::buf::{self, Encodable};
use codec::error::CodecError;
use log::warn;

/// One record as stored in a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Partition-local offset of the record.
    pub offset: i64,

    /// Record timestamp, milliseconds since the epoch.
    pub timestamp: i64,

    pub key: Option<Bytes>,

    pub value: Option<Bytes>,

    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub key: String,
    pub value: Option<Bytes>,
}

impl Encodable for Header {
    fn size(&self) -> i32 {
        buf::size_of_str(&self.key) + buf::size_of_nullable_bytes(self.value.as_ref())
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf::write_str(buf, &self.key);
        buf::write_nullable_bytes(buf, self.value.as_ref());
    }
}

impl Header {
    fn read_from(src: &mut Bytes) -> Result<Header, CodecError> {
        Ok(Header {
            key: buf::read_str(src)?,
            value: buf::read_nullable_bytes(src)?,
        })
    }
}

impl Encodable for Record {
    fn size(&self) -> i32 {
        8 + 8
            + buf::size_of_nullable_bytes(self.key.as_ref())
            + buf::size_of_nullable_bytes(self.value.as_ref())
            + buf::size_of_array(&self.headers)
    }

    fn write_to(&self, buf: &mut BytesMut) {
        buf.put_i64(self.offset);
        buf.put_i64(self.timestamp);
        buf::write_nullable_bytes(buf, self.key.as_ref());
        buf::write_nullable_bytes(buf, self.value.as_ref());
        buf::write_array(buf, &self.headers);
    }
}

impl Record {
    fn read_from(src: &mut Bytes) -> Result<Record, CodecError> {
        let offset = buf::read_i64(src)?;
        let timestamp = buf::read_i64(src)?;
        let key = buf::read_nullable_bytes(src)?;
        let value = buf::read_nullable_bytes(src)?;
        let count = buf::read_array_count(src)?.max(0);
        let mut headers = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            headers.push(Header::read_from(src)?);
        }
        Ok(Record {
            offset,
            timestamp,
            key,
            value,
            headers,
        })
    }
}

/// Serialize records into one contiguous batch blob, the form a broker
/// returns them in a fetch response partition.
pub fn encode_batch(records: &[Record]) -> Bytes {
    let size = records.iter().map(Encodable::size).sum::<i32>();
    let mut buf = BytesMut::with_capacity(size as usize);
    for record in records {
        record.write_to(&mut buf);
    }
    buf.freeze()
}

/// A single-pass decoding cursor over one fetched record batch.
///
/// Yields records in storage order and stops at the end of the batch it was
/// constructed over; it never fetches more. The batch may begin at offsets
/// earlier than the one requested, and the reader does not filter those;
/// callers skip by comparing offsets.
///
/// The reader owns the undecoded buffer. [`RecordReader::release`] drops it
/// and stops further decoding; releasing more than once is a no-op, and
/// `Drop` releases as a backstop so an abandoned reader cannot pin the
/// batch buffer.
#[derive(Debug, Default)]
pub struct RecordReader {
    buf: Bytes,
    released: bool,
}

impl RecordReader {
    pub fn new(buf: Bytes) -> Self {
        Self {
            buf,
            released: false,
        }
    }

    /// A reader that is exhausted from the start.
    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }

    /// Drop the remaining undecoded batch data. Safe to call repeatedly.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.buf = Bytes::new();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.released || !self.buf.has_remaining() {
            return None;
        }
        match Record::read_from(&mut self.buf) {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                warn!("Failed to decode record batch, dropping the remainder. Cause: {}", e);
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl Drop for RecordReader {
    fn drop(&mut self) {
        self.release();
    }
}
