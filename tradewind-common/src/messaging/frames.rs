//! The two-frame wire format: `[header, body]`, each individually
//! compressed.
//!
//! The header is a string-to-string map carrying at least `MessageType` and
//! `Type` (the payload name), encoded with the same binary map codec as the
//! envelopes themselves.

use std::fmt;
use std::str::FromStr;

use super::compression::Compressor;
use crate::error::TradingError;
use crate::serialization::{keys, ObjectMap};

/// The top-level classification of a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    String,
    Request,
    Response,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::String => "String",
            MessageType::Request => "Request",
            MessageType::Response => "Response",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(MessageType::String),
            "Request" => Ok(MessageType::Request),
            "Response" => Ok(MessageType::Response),
            other => Err(TradingError::Serialization(format!(
                "unknown message type '{other}'"
            ))),
        }
    }
}

/// The two compressed frames a message travels as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFrames {
    pub header: Vec<u8>,
    pub body: Vec<u8>,
}

impl MessageFrames {
    /// Pack a typed payload into compressed frames.
    pub fn pack(
        message_type: MessageType,
        type_name: &str,
        body: &[u8],
        compressor: &dyn Compressor,
    ) -> Self {
        let mut header = ObjectMap::new();
        header.put("MessageType", message_type.as_str());
        header.put(keys::TYPE, type_name);
        Self {
            header: compressor.compress(&header.encode()),
            body: compressor.compress(body),
        }
    }

    /// Unpack frames into `(message_type, type_name, body)`.
    pub fn unpack(
        &self,
        compressor: &dyn Compressor,
    ) -> Result<(MessageType, String, Vec<u8>), TradingError> {
        let header_bytes = compressor.decompress(&self.header)?;
        let header = ObjectMap::decode(&header_bytes)?;
        let message_type = MessageType::from_str(header.get_str("MessageType")?)?;
        let type_name = header.get_str(keys::TYPE)?.to_string();
        let body = compressor.decompress(&self.body)?;
        Ok((message_type, type_name, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{BypassCompressor, Lz4Compressor};

    #[test]
    fn frames_round_trip_with_lz4() {
        let compressor = Lz4Compressor;
        let frames = MessageFrames::pack(
            MessageType::Request,
            "Connect",
            b"payload bytes",
            &compressor,
        );
        let (message_type, type_name, body) = frames.unpack(&compressor).unwrap();
        assert_eq!(message_type, MessageType::Request);
        assert_eq!(type_name, "Connect");
        assert_eq!(body, b"payload bytes");
    }

    #[test]
    fn frames_round_trip_with_bypass() {
        let compressor = BypassCompressor;
        let frames =
            MessageFrames::pack(MessageType::Response, "Connected", b"ok", &compressor);
        let (message_type, type_name, body) = frames.unpack(&compressor).unwrap();
        assert_eq!(message_type, MessageType::Response);
        assert_eq!(type_name, "Connected");
        assert_eq!(body, b"ok");
    }

    #[test]
    fn compressor_mismatch_fails() {
        let frames = MessageFrames::pack(
            MessageType::String,
            "Log",
            b"hello",
            &Lz4Compressor,
        );
        // Bypass decompression yields bytes that are not a valid map.
        assert!(frames.unpack(&BypassCompressor).is_err());
    }
}
