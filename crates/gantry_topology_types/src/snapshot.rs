//! The flat, wire-compatible view of a switch forest.
//!
//! Wire layout: a big-endian `u32` record count followed by one record per
//! switch, each encoded as `level: u16`, `link_speed: u32`, then the `name`,
//! `nodes` and `switches` strings. Strings are a `u32` byte length followed
//! by that many UTF-8 bytes. Integers are network byte order throughout;
//! both sides of the RPC must match this layout bit for bit.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

// level + link_speed + three empty strings.
const MIN_RECORD_ENCODED_LEN: usize = 2 + 4 + 3 * 4;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer exhausted while reading {field}")]
    Truncated { field: &'static str },
    #[error("string field {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
    #[error("{remaining} bytes left past the last record")]
    TrailingBytes { remaining: usize },
}

/// One switch, flattened for transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyRecord {
    pub level: u16,
    pub link_speed: u32,
    pub name: String,
    pub nodes: String,
    pub switches: String,
}

/// The full forest, flattened for transport. Record order is switch-table
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub records: Vec<TopologyRecord>,
}

impl TopologySnapshot {
    pub fn record_count(&self) -> u32 {
        u32::try_from(self.records.len()).expect("switch table exceeds u32::MAX records")
    }

    pub fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.record_count());
        for record in &self.records {
            buf.put_u16(record.level);
            buf.put_u32(record.link_speed);
            pack_str(&record.name, buf);
            pack_str(&record.nodes, buf);
            pack_str(&record.switches, buf);
        }
    }

    /// The exact inverse of [`TopologySnapshot::pack`]. Truncated or
    /// malformed input yields a [`DecodeError`] and no partial snapshot.
    pub fn unpack(mut src: &[u8]) -> Result<Self, DecodeError> {
        let record_count = take_u32(&mut src, "record_count")?;
        let record_count = usize::try_from(record_count)
            .map_err(|_| DecodeError::Truncated { field: "record_count" })?;
        if record_count.saturating_mul(MIN_RECORD_ENCODED_LEN) > src.remaining() {
            return Err(DecodeError::Truncated { field: "record_count" });
        }
        let mut records = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            records.push(TopologyRecord {
                level: take_u16(&mut src, "level")?,
                link_speed: take_u32(&mut src, "link_speed")?,
                name: take_str(&mut src, "name")?,
                nodes: take_str(&mut src, "nodes")?,
                switches: take_str(&mut src, "switches")?,
            });
        }
        if src.has_remaining() {
            return Err(DecodeError::TrailingBytes { remaining: src.remaining() });
        }
        Ok(Self { records })
    }
}

fn pack_str(value: &str, buf: &mut BytesMut) {
    let len = u32::try_from(value.len()).expect("string field exceeds u32::MAX bytes");
    buf.put_u32(len);
    buf.put_slice(value.as_bytes());
}

fn take_u16(src: &mut &[u8], field: &'static str) -> Result<u16, DecodeError> {
    if src.remaining() < 2 {
        return Err(DecodeError::Truncated { field });
    }
    Ok(src.get_u16())
}

fn take_u32(src: &mut &[u8], field: &'static str) -> Result<u32, DecodeError> {
    if src.remaining() < 4 {
        return Err(DecodeError::Truncated { field });
    }
    Ok(src.get_u32())
}

fn take_str(src: &mut &[u8], field: &'static str) -> Result<String, DecodeError> {
    let len = take_u32(src, field)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::Truncated { field })?;
    if src.remaining() < len {
        return Err(DecodeError::Truncated { field });
    }
    let bytes = src.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
}
