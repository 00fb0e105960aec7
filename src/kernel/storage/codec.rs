//! Payload encodings: raw DEFLATE compression and repeating-key XOR
//! obfuscation, carried as base64 text inside the JSON envelope.
//!
//! Obfuscation only keeps values from being readable at a glance; it is
//! not encryption.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};

use super::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoding {
    pub compressed: bool,
    pub obfuscated: bool,
}

impl Encoding {
    pub const PLAIN: Encoding = Encoding {
        compressed: false,
        obfuscated: false,
    };

    pub fn is_plain(self) -> bool {
        !self.compressed && !self.obfuscated
    }
}

pub struct PayloadCodec {
    key: Vec<u8>,
}

impl PayloadCodec {
    pub fn new(obfuscation_key: &str) -> Self {
        let key = if obfuscation_key.is_empty() {
            b"stylelab".to_vec()
        } else {
            obfuscation_key.as_bytes().to_vec()
        };
        Self { key }
    }

    pub fn encode(&self, value: &Value, encoding: Encoding) -> Result<Value, StoreError> {
        if encoding.is_plain() {
            return Ok(value.clone());
        }

        let mut bytes = serde_json::to_vec(value)?;
        if encoding.compressed {
            bytes = deflate(&bytes)?;
        }
        if encoding.obfuscated {
            self.xor(&mut bytes);
        }
        Ok(Value::String(STANDARD.encode(bytes)))
    }

    pub fn decode(&self, stored: &Value, encoding: Encoding) -> Result<Value, StoreError> {
        if encoding.is_plain() {
            return Ok(stored.clone());
        }

        let text = stored
            .as_str()
            .ok_or_else(|| StoreError::Codec("encoded payload is not a string".to_string()))?;
        let mut bytes = STANDARD
            .decode(text)
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        if encoding.obfuscated {
            self.xor(&mut bytes);
        }
        if encoding.compressed {
            bytes = inflate(&bytes)?;
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn xor(&self, bytes: &mut [u8]) {
        for (byte, k) in bytes.iter_mut().zip(self.key.iter().cycle()) {
            *byte ^= k;
        }
    }
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|_| encoder.finish())
        .map_err(|e| StoreError::Codec(e.to_string()))
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    DeflateDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| StoreError::Codec(e.to_string()))?;
    Ok(out)
}
