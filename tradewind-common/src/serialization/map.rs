//! The binary string-keyed map codec underlying every envelope.
//!
//! Layout: a big-endian u32 entry count, then per entry a u16-prefixed
//! UTF-8 key and a u32-prefixed value. Keys are held sorted so that equal
//! maps always encode to identical bytes.

use std::collections::BTreeMap;

use crate::error::TradingError;

/// A serialized object: sorted string keys to byte values (usually UTF-8).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMap {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into().into_bytes());
    }

    pub fn put_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// A required string value; missing or non-UTF-8 fails.
    pub fn get_str(&self, key: &str) -> Result<&str, TradingError> {
        let bytes = self.get_bytes(key)?;
        std::str::from_utf8(bytes)
            .map_err(|_| TradingError::Serialization(format!("value for '{key}' is not UTF-8")))
    }

    /// A required byte value; missing fails.
    pub fn get_bytes(&self, key: &str) -> Result<&[u8], TradingError> {
        self.entries
            .get(key)
            .map(|v| v.as_slice())
            .ok_or_else(|| TradingError::Serialization(format!("missing key '{key}'")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for (key, value) in &self.entries {
            buffer.extend_from_slice(&(key.len() as u16).to_be_bytes());
            buffer.extend_from_slice(key.as_bytes());
            buffer.extend_from_slice(&(value.len() as u32).to_be_bytes());
            buffer.extend_from_slice(value);
        }
        buffer
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TradingError> {
        let mut cursor = Cursor { bytes, offset: 0 };
        let count = u32::from_be_bytes(cursor.take(4)?.try_into().expect("4 bytes"));
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key_len = u16::from_be_bytes(cursor.take(2)?.try_into().expect("2 bytes")) as usize;
            let key = std::str::from_utf8(cursor.take(key_len)?)
                .map_err(|_| TradingError::Serialization("map key is not UTF-8".to_string()))?
                .to_string();
            let value_len =
                u32::from_be_bytes(cursor.take(4)?.try_into().expect("4 bytes")) as usize;
            let value = cursor.take(value_len)?.to_vec();
            entries.insert(key, value);
        }
        if cursor.offset != bytes.len() {
            return Err(TradingError::Serialization(
                "trailing bytes after map payload".to_string(),
            ));
        }
        Ok(Self { entries })
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TradingError> {
        if self.offset + n > self.bytes.len() {
            return Err(TradingError::Serialization(
                "map payload truncated".to_string(),
            ));
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }
}
