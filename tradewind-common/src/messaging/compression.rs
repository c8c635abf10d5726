//! Pluggable frame compression.

use std::fmt;

use crate::error::TradingError;

pub trait Compressor: fmt::Debug {
    fn compress(&self, payload: &[u8]) -> Vec<u8>;

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TradingError>;
}

/// LZ4 block compression with a length prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl Compressor for Lz4Compressor {
    fn compress(&self, payload: &[u8]) -> Vec<u8> {
        lz4_flex::compress_prepend_size(payload)
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TradingError> {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| TradingError::Serialization(format!("lz4 decompression failed: {e}")))
    }
}

/// No compression at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct BypassCompressor;

impl Compressor for BypassCompressor {
    fn compress(&self, payload: &[u8]) -> Vec<u8> {
        payload.to_vec()
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TradingError> {
        Ok(payload.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lz4_round_trips() {
        let compressor = Lz4Compressor;
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = compressor.compress(&payload);
        assert!(compressed.len() < payload.len());
        assert_eq!(compressor.decompress(&compressed).unwrap(), payload);
    }

    #[test]
    fn bypass_is_identity() {
        let compressor = BypassCompressor;
        let payload = vec![1, 2, 3];
        assert_eq!(compressor.compress(&payload), payload);
        assert_eq!(compressor.decompress(&payload).unwrap(), payload);
    }

    #[test]
    fn lz4_rejects_garbage() {
        let compressor = Lz4Compressor;
        assert!(compressor.decompress(&[0xFF, 0xFF, 0xFF]).is_err());
    }
}
