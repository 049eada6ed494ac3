//! Journal record format
//!
//! Binary format: [op(u8)] [timestamp(i64)] [key_len(u32)] [key] [payload_count(u32)] [len(u32) bytes]... [checksum(u64)]

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::Utc;

/// Smallest possible record: op + timestamp + key_len + payload_count + checksum
const MIN_RECORD_LEN: usize = 1 + 8 + 4 + 4 + 8;

/// Journal operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JournalOp {
    /// set_item(key, value)
    Set = 1,
    /// remove_item(key)
    Remove = 2,
}

impl JournalOp {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(JournalOp::Set),
            2 => Some(JournalOp::Remove),
            _ => None,
        }
    }
}

/// Errors while decoding a record
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("truncated record: missing {0}")]
    Truncated(&'static str),

    #[error("unknown operation type {0}")]
    UnknownOp(u8),

    #[error("checksum mismatch: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch { stored: u64, computed: u64 },
}

/// One journal record
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub op: JournalOp,
    /// Milliseconds since UNIX epoch
    pub timestamp: i64,
    pub key: Bytes,
    pub payload: Vec<Bytes>,
}

impl JournalEntry {
    pub fn new(op: JournalOp, key: Bytes, payload: Vec<Bytes>) -> Self {
        JournalEntry {
            op,
            timestamp: Utc::now().timestamp_millis(),
            key,
            payload,
        }
    }

    /// Record for `set_item`
    pub fn set(key: &str, value: &str) -> Self {
        Self::new(
            JournalOp::Set,
            Bytes::copy_from_slice(key.as_bytes()),
            vec![Bytes::copy_from_slice(value.as_bytes())],
        )
    }

    /// Record for `remove_item`
    pub fn remove(key: &str) -> Self {
        Self::new(JournalOp::Remove, Bytes::copy_from_slice(key.as_bytes()), vec![])
    }

    /// Serialize with a trailing xxh64 checksum
    pub fn to_bytes(&self) -> Bytes {
        let payload_len: usize = self.payload.iter().map(|p| 4 + p.len()).sum();
        let mut buf = BytesMut::with_capacity(MIN_RECORD_LEN + self.key.len() + payload_len);

        buf.put_u8(self.op as u8);
        buf.put_i64_le(self.timestamp);
        buf.put_u32_le(self.key.len() as u32);
        buf.put_slice(&self.key);
        buf.put_u32_le(self.payload.len() as u32);
        for item in &self.payload {
            buf.put_u32_le(item.len() as u32);
            buf.put_slice(item);
        }

        let checksum = xxhash_rust::xxh64::xxh64(&buf, 0);
        buf.put_u64_le(checksum);

        buf.freeze()
    }

    /// Deserialize one record from the front of `data`
    ///
    /// Returns the record and the number of bytes it used.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        if data.len() < MIN_RECORD_LEN {
            return Err(JournalError::Truncated("header"));
        }

        let mut cursor = data;

        let op_byte = cursor.get_u8();
        let op = JournalOp::from_u8(op_byte).ok_or(JournalError::UnknownOp(op_byte))?;
        let timestamp = cursor.get_i64_le();
        let key = take_chunk(&mut cursor, "key")?;

        if cursor.remaining() < 4 {
            return Err(JournalError::Truncated("payload count"));
        }
        let payload_count = cursor.get_u32_le() as usize;

        let mut payload = Vec::with_capacity(payload_count.min(16));
        for _ in 0..payload_count {
            payload.push(take_chunk(&mut cursor, "payload")?);
        }

        let body_len = data.len() - cursor.remaining();
        if cursor.remaining() < 8 {
            return Err(JournalError::Truncated("checksum"));
        }
        let stored = cursor.get_u64_le();
        let computed = xxhash_rust::xxh64::xxh64(&data[..body_len], 0);
        if stored != computed {
            return Err(JournalError::ChecksumMismatch { stored, computed });
        }

        Ok((
            JournalEntry {
                op,
                timestamp,
                key,
                payload,
            },
            body_len + 8,
        ))
    }
}

/// Read a length-prefixed chunk
fn take_chunk(cursor: &mut &[u8], what: &'static str) -> Result<Bytes, JournalError> {
    if cursor.remaining() < 4 {
        return Err(JournalError::Truncated(what));
    }
    let len = cursor.get_u32_le() as usize;
    if cursor.remaining() < len {
        return Err(JournalError::Truncated(what));
    }
    let chunk = Bytes::copy_from_slice(&cursor[..len]);
    cursor.advance(len);
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize_set() {
        let entry = JournalEntry::set("theme", "dark");

        let bytes = entry.to_bytes();
        let (decoded, size) = JournalEntry::from_bytes(&bytes).unwrap();

        assert_eq!(size, bytes.len());
        assert_eq!(decoded, entry);
        assert_eq!(decoded.payload[0], Bytes::from("dark"));
    }

    #[test]
    fn test_two_records_back_to_back() {
        let mut data = JournalEntry::set("a", "1").to_bytes().to_vec();
        data.extend_from_slice(&JournalEntry::remove("a").to_bytes());

        let (first, used) = JournalEntry::from_bytes(&data).unwrap();
        assert_eq!(first.op, JournalOp::Set);

        let (second, _) = JournalEntry::from_bytes(&data[used..]).unwrap();
        assert_eq!(second.op, JournalOp::Remove);
        assert!(second.payload.is_empty());
    }

    #[test]
    fn test_checksum_validation() {
        let mut bytes = JournalEntry::set("key", "value").to_bytes().to_vec();

        // Corrupt the checksum
        let len = bytes.len();
        bytes[len - 1] ^= 0xFF;

        let result = JournalEntry::from_bytes(&bytes);
        assert!(matches!(result, Err(JournalError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_truncated() {
        let bytes = JournalEntry::set("key", "value").to_bytes();
        let result = JournalEntry::from_bytes(&bytes[..bytes.len() - 3]);
        assert_eq!(result.unwrap_err(), JournalError::Truncated("checksum"));
    }

    #[test]
    fn test_unknown_op() {
        let mut bytes = JournalEntry::remove("key").to_bytes().to_vec();
        bytes[0] = 9;
        assert_eq!(
            JournalEntry::from_bytes(&bytes).unwrap_err(),
            JournalError::UnknownOp(9)
        );
    }
}
