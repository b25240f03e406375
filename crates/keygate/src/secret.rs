//! 256-bit symmetric key material

use zeroize::{Zeroize, ZeroizeOnDrop};

/// key bytes, wiped on drop. not `Clone` on purpose: move it to the one
/// place that needs it.
#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// parse a 64-character hex string
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes).ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// fresh random key
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts() {
        let key = SecretKey::from_bytes([0xab; 32]);
        let printed = format!("{:?}", key);
        assert!(!printed.contains("ab"));
    }

    #[test]
    fn test_hex() {
        let key = SecretKey::from_bytes([7u8; 32]);
        let parsed = SecretKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed, key);
        assert!(SecretKey::from_hex("abcd").is_none());
    }
}
