//! arithmetic over the secp256k1 base field
//!
//! p = 2^256 - 2^32 - 977. only the prime is borrowed from secp256k1,
//! no curve operations happen here. elements are kept reduced into
//! [0, p) and products are formed at full width before reduction.

use std::sync::OnceLock;

use num_bigint::{BigUint, RandBigInt};
use rand::{CryptoRng, RngCore};

use crate::{Error, Result};

/// big-endian encoding of the field modulus
pub const MODULUS_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xfc, 0x2f,
];

/// byte width of a canonical element
pub const ELEMENT_BYTES: usize = 32;

/// the field modulus as a bigint
pub fn modulus() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| BigUint::from_bytes_be(&MODULUS_BYTES))
}

/// element of GF(p), always reduced
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Felt(BigUint);

impl Felt {
    pub fn zero() -> Self {
        Self(BigUint::ZERO)
    }

    pub fn one() -> Self {
        Self(BigUint::from(1u8))
    }

    pub fn from_u64(v: u64) -> Self {
        Self(BigUint::from(v) % modulus())
    }

    /// reduce an arbitrary bigint into the field
    pub fn from_biguint(v: &BigUint) -> Self {
        Self(v % modulus())
    }

    /// parse a canonical big-endian element, None if >= p
    pub fn from_canonical_bytes(bytes: &[u8; ELEMENT_BYTES]) -> Option<Self> {
        let v = BigUint::from_bytes_be(bytes);
        if &v < modulus() {
            Some(Self(v))
        } else {
            None
        }
    }

    /// big-endian, left padded to 32 bytes
    pub fn to_be_bytes(&self) -> [u8; ELEMENT_BYTES] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; ELEMENT_BYTES];
        out[ELEMENT_BYTES - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// uniform element drawn from a cryptographic rng
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(rng.gen_biguint_below(modulus()))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::ZERO
    }

    pub fn add(&self, other: &Self) -> Self {
        Self((&self.0 + &other.0) % modulus())
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self((&self.0 + modulus() - &other.0) % modulus())
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self((&self.0 * &other.0) % modulus())
    }

    pub fn neg(&self) -> Self {
        if self.is_zero() {
            Self::zero()
        } else {
            Self(modulus() - &self.0)
        }
    }

    pub fn pow(&self, exp: &BigUint) -> Self {
        Self(self.0.modpow(exp, modulus()))
    }

    /// multiplicative inverse via fermat: a^(p-2) mod p
    pub fn modinv(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::InvalidInput("zero has no multiplicative inverse".into()));
        }
        let exp = modulus() - BigUint::from(2u8);
        Ok(self.pow(&exp))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl std::fmt::Debug for Felt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Felt(0x{})", hex::encode(self.to_be_bytes()))
    }
}

impl From<u64> for Felt {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}
