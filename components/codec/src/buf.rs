//! Primitive building blocks of the wire format.
//!
//! Every composite message is encoded big-endian with length-prefixed
//! variable-width fields: strings carry an `i16` length, byte blobs and
//! arrays an `i32` length or element count. Nullable blobs and arrays use
//! `-1` as their absent sentinel. Zero-length values still carry their
//! prefix.
//!
//! Encoders follow a two-pass contract: `size` computes the exact number of
//! bytes `write_to` will emit, walking fields in the same order, so callers
//! can pre-allocate one buffer and never reallocate mid-serialize.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::warn;

use crate::error::CodecError;

/// Length sentinel of an absent nullable blob or array.
pub const NULL_LENGTH: i32 = -1;

pub trait Encodable {
    /// Exact number of bytes `write_to` will produce for this instance.
    fn size(&self) -> i32;

    /// Serialize into `buf`, emitting exactly `size()` bytes.
    fn write_to(&self, buf: &mut BytesMut);
}

pub fn size_of_str(s: &str) -> i32 {
    2 + s.len() as i32
}

pub fn size_of_nullable_bytes(b: Option<&Bytes>) -> i32 {
    4 + b.map(|b| b.len() as i32).unwrap_or(0)
}

pub fn size_of_array<T: Encodable>(items: &[T]) -> i32 {
    4 + items.iter().map(Encodable::size).sum::<i32>()
}

pub fn write_str(buf: &mut BytesMut, s: &str) {
    buf.put_i16(s.len() as i16);
    buf.put_slice(s.as_bytes());
}

pub fn write_nullable_bytes(buf: &mut BytesMut, b: Option<&Bytes>) {
    match b {
        Some(b) => {
            buf.put_i32(b.len() as i32);
            buf.put_slice(b);
        }
        None => buf.put_i32(NULL_LENGTH),
    }
}

pub fn write_array<T: Encodable>(buf: &mut BytesMut, items: &[T]) {
    buf.put_i32(items.len() as i32);
    for item in items {
        item.write_to(buf);
    }
}

fn ensure(src: &Bytes, needed: usize) -> Result<(), CodecError> {
    if src.remaining() < needed {
        return Err(CodecError::Incomplete {
            needed,
            remaining: src.remaining(),
        });
    }
    Ok(())
}

pub fn read_i8(src: &mut Bytes) -> Result<i8, CodecError> {
    ensure(src, 1)?;
    Ok(src.get_i8())
}

pub fn read_i16(src: &mut Bytes) -> Result<i16, CodecError> {
    ensure(src, 2)?;
    Ok(src.get_i16())
}

pub fn read_i32(src: &mut Bytes) -> Result<i32, CodecError> {
    ensure(src, 4)?;
    Ok(src.get_i32())
}

pub fn read_i64(src: &mut Bytes) -> Result<i64, CodecError> {
    ensure(src, 8)?;
    Ok(src.get_i64())
}

/// Read a length-prefixed string. A negative length decodes as an empty
/// string, matching the null-string sentinel on the wire.
pub fn read_str(src: &mut Bytes) -> Result<String, CodecError> {
    let len = read_i16(src)?;
    if len < 0 {
        return Ok(String::new());
    }
    ensure(src, len as usize)?;
    let raw = src.copy_to_bytes(len as usize);
    String::from_utf8(raw.to_vec()).map_err(|_| {
        warn!("String field of {} bytes is not valid UTF-8", len);
        CodecError::InvalidUtf8
    })
}

/// Read a length-prefixed byte blob. A negative length decodes as `None`.
///
/// The returned `Bytes` is a cheap slice of `src`, not a copy.
pub fn read_nullable_bytes(src: &mut Bytes) -> Result<Option<Bytes>, CodecError> {
    let len = read_i32(src)?;
    if len < 0 {
        return Ok(None);
    }
    ensure(src, len as usize)?;
    Ok(Some(src.copy_to_bytes(len as usize)))
}

/// Read an array element count. Negative counts are the null-array sentinel.
pub fn read_array_count(src: &mut Bytes) -> Result<i32, CodecError> {
    read_i32(src)
}
