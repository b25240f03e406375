//! share types and serialization
//!
//! a share is one point (index, f(index)) on the polynomial hiding a key.
//! shares can be encoded as:
//! - hex string
//! - base64 string
//!
//! wire layout: version (1) | index u32 le (4) | value be (32) | checksum (4)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::field::{Felt, ELEMENT_BYTES};
use crate::{Error, Result};

const SHARE_VERSION: u8 = 1;
const CHECKSUM_LEN: usize = 4;
const ENCODED_LEN: usize = 1 + 4 + ELEMENT_BYTES + CHECKSUM_LEN;

/// one point on a secret-defining polynomial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// share index (1-indexed, never 0)
    pub index: u32,
    /// f(index) mod p
    #[serde(with = "hex_felt")]
    pub value: Felt,
}

impl Share {
    pub fn new(index: u32, value: Felt) -> Self {
        Self { index, value }
    }

    /// build from the external (index, bytes[32]) form
    pub fn from_parts(index: u32, value: &[u8; ELEMENT_BYTES]) -> Result<Self> {
        if index == 0 {
            return Err(Error::InvalidShareFormat);
        }
        let value = Felt::from_canonical_bytes(value).ok_or(Error::InvalidShareFormat)?;
        Ok(Self { index, value })
    }

    /// the external (index, bytes[32]) form
    pub fn to_parts(&self) -> (u32, [u8; ELEMENT_BYTES]) {
        (self.index, self.value.to_be_bytes())
    }

    /// encode as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// decode from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| Error::InvalidShareFormat)?;
        Self::from_bytes(&bytes)
    }

    /// encode as base64
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// decode from base64
    pub fn from_base64(s: &str) -> Result<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(s.trim())
            .map_err(|_| Error::InvalidShareFormat)?;
        Self::from_bytes(&bytes)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENCODED_LEN);
        bytes.push(SHARE_VERSION);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.value.to_be_bytes());
        let checksum = checksum(&bytes);
        bytes.extend_from_slice(&checksum);
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENCODED_LEN || bytes[0] != SHARE_VERSION {
            return Err(Error::InvalidShareFormat);
        }

        let (body, tail) = bytes.split_at(ENCODED_LEN - CHECKSUM_LEN);
        if checksum(body) != tail {
            return Err(Error::InvalidShareFormat);
        }

        let index = u32::from_le_bytes([body[1], body[2], body[3], body[4]]);
        let mut value = [0u8; ELEMENT_BYTES];
        value.copy_from_slice(&body[5..]);
        Self::from_parts(index, &value)
    }
}

fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(b"keygate:share_checksum:v1");
    hasher.update(body);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// hex serialization helper for serde
mod hex_felt {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::field::{Felt, ELEMENT_BYTES};

    pub fn serialize<S>(value: &Felt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value.to_be_bytes()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Felt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; ELEMENT_BYTES];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Felt::from_canonical_bytes(&bytes)
            .ok_or_else(|| serde::de::Error::custom("share value not below field modulus"))
    }
}
