//! shamir (k, n) secret sharing over the secp256k1 base field
//!
//! the secret is the constant term of a random degree k-1 polynomial.
//! share i is f(i) for i = 1..=n; index 0 is never handed out since f(0)
//! is the secret itself. any k shares recover f(0) by interpolation.

use std::collections::HashSet;

use rand::{CryptoRng, RngCore};

use crate::field::Felt;
use crate::lagrange::interpolate_at_zero;
use crate::secret::SecretKey;
use crate::share::Share;
use crate::{Error, Result};

fn check_params(k: usize, n: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidParameters("threshold must be at least 1".into()));
    }
    if k > n {
        return Err(Error::InvalidParameters(format!(
            "threshold {} exceeds share count {}",
            k, n
        )));
    }
    if u32::try_from(n).is_err() {
        return Err(Error::InvalidParameters(format!("share count {} too large", n)));
    }
    Ok(())
}

/// evaluate polynomial at point x (horner)
fn poly_eval(coeffs: &[Felt], x: &Felt) -> Felt {
    coeffs
        .iter()
        .rev()
        .fold(Felt::zero(), |acc, c| acc.mul(x).add(c))
}

/// split a field element into n shares, any k of which recover it
pub fn split(secret: &Felt, k: usize, n: usize) -> Result<Vec<Share>> {
    split_with_rng(secret, k, n, &mut rand::thread_rng())
}

/// split with a caller-provided rng
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &Felt,
    k: usize,
    n: usize,
    rng: &mut R,
) -> Result<Vec<Share>> {
    check_params(k, n)?;

    // f(x) = secret + c1*x + ... + c(k-1)*x^(k-1)
    let mut coeffs = Vec::with_capacity(k);
    coeffs.push(secret.clone());
    for _ in 1..k {
        coeffs.push(Felt::random(rng));
    }

    let shares = (1..=n as u32)
        .map(|i| Share::new(i, poly_eval(&coeffs, &Felt::from(u64::from(i)))))
        .collect();

    Ok(shares)
}

/// reconstruct the secret from the first k of the supplied shares
///
/// every supplied share must carry a distinct non-zero index; fewer than
/// k shares is an error, never a best-effort answer.
pub fn reconstruct(shares: &[Share], k: usize) -> Result<Felt> {
    if k == 0 {
        return Err(Error::InvalidParameters("threshold must be at least 1".into()));
    }
    if shares.len() < k {
        return Err(Error::InsufficientShares {
            have: shares.len(),
            need: k,
        });
    }

    let mut seen = HashSet::with_capacity(shares.len());
    for share in shares {
        if share.index == 0 {
            return Err(Error::InvalidParameters("share index must be non-zero".into()));
        }
        if !seen.insert(share.index) {
            return Err(Error::DuplicateIndex(share.index));
        }
    }

    let points: Vec<(u32, Felt)> = shares
        .iter()
        .take(k)
        .map(|s| (s.index, s.value.clone()))
        .collect();

    interpolate_at_zero(&points)
}

/// split a 32-byte key (big-endian integer); the key must be below p
pub fn split_secret(secret: &SecretKey, k: usize, n: usize) -> Result<Vec<Share>> {
    let value = Felt::from_canonical_bytes(secret.as_bytes()).ok_or(Error::SecretOutOfRange)?;
    split(&value, k, n)
}

/// reconstruct a 32-byte key from shares
pub fn reconstruct_secret(shares: &[Share], k: usize) -> Result<SecretKey> {
    reconstruct(shares, k).map(|v| SecretKey::from_bytes(v.to_be_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::MODULUS_BYTES;
    use proptest::prelude::*;

    /// all k-subsets of 0..n, lexicographic
    fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
        fn go(start: usize, n: usize, k: usize, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            if cur.len() == k {
                out.push(cur.clone());
                return;
            }
            for i in start..n {
                cur.push(i);
                go(i + 1, n, k, cur, out);
                cur.pop();
            }
        }
        let mut out = Vec::new();
        go(0, n, k, &mut Vec::new(), &mut out);
        out
    }

    #[test]
    fn test_split_indices() {
        let shares = split(&Felt::from(42), 3, 5).unwrap();
        let indices: Vec<u32> = shares.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_every_subset_small_n() {
        let mut rng = rand::thread_rng();
        for n in 1..=7 {
            for k in 1..=n {
                let secret = Felt::random(&mut rng);
                let shares = split(&secret, k, n).unwrap();
                for subset in combinations(n, k) {
                    let picked: Vec<Share> = subset.iter().map(|&i| shares[i].clone()).collect();
                    assert_eq!(
                        reconstruct(&picked, k).unwrap(),
                        secret,
                        "k={} n={} subset={:?}",
                        k,
                        n,
                        subset
                    );
                }
            }
        }
    }

    #[test]
    fn test_order_does_not_matter() {
        let secret = Felt::from(987_654_321);
        let shares = split(&secret, 4, 7).unwrap();
        let forward: Vec<Share> = [1, 3, 5, 6].iter().map(|&i| shares[i].clone()).collect();
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(reconstruct(&forward, 4).unwrap(), secret);
        assert_eq!(reconstruct(&backward, 4).unwrap(), secret);
    }

    #[test]
    fn test_k_equals_one_is_constant() {
        let secret = Felt::from(77);
        let shares = split(&secret, 1, 4).unwrap();
        for share in &shares {
            assert_eq!(share.value, secret);
            assert_eq!(reconstruct(std::slice::from_ref(share), 1).unwrap(), secret);
        }
    }

    #[test]
    fn test_n_equals_one() {
        let secret = Felt::from(5);
        let shares = split(&secret, 1, 1).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(reconstruct(&shares, 1).unwrap(), secret);
    }

    #[test]
    fn test_split_is_randomized() {
        let secret = Felt::from(11);
        let a = split(&secret, 3, 5).unwrap();
        let b = split(&secret, 3, 5).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_params() {
        let secret = Felt::from(1);
        assert!(matches!(split(&secret, 0, 3), Err(Error::InvalidParameters(_))));
        assert!(matches!(split(&secret, 4, 3), Err(Error::InvalidParameters(_))));
        assert!(matches!(split(&secret, 0, 0), Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn test_insufficient_shares() {
        let shares = split(&Felt::from(9), 4, 7).unwrap();
        assert_eq!(
            reconstruct(&shares[..3], 4),
            Err(Error::InsufficientShares { have: 3, need: 4 })
        );
        assert!(matches!(
            reconstruct(&[], 1),
            Err(Error::InsufficientShares { have: 0, need: 1 })
        ));
    }

    #[test]
    fn test_duplicate_index() {
        let shares = split(&Felt::from(9), 2, 3).unwrap();
        let dup = vec![shares[0].clone(), shares[0].clone()];
        assert_eq!(reconstruct(&dup, 2), Err(Error::DuplicateIndex(1)));
    }

    #[test]
    fn test_wrong_share_gives_wrong_secret() {
        let secret = Felt::from(1234);
        let mut shares = split(&secret, 2, 3).unwrap();
        shares[0].value = shares[0].value.add(&Felt::one());
        assert_ne!(reconstruct(&shares, 2).unwrap(), secret);
    }

    #[test]
    fn test_secret_bytes_roundtrip() {
        let key = SecretKey::from_bytes([0x5a; 32]);
        let shares = split_secret(&key, 3, 5).unwrap();
        let recovered = reconstruct_secret(&shares[2..], 3).unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn test_secret_out_of_range() {
        let key = SecretKey::from_bytes(MODULUS_BYTES);
        assert_eq!(split_secret(&key, 2, 3).unwrap_err(), Error::SecretOutOfRange);
    }

    /// (n, k, a random ordering of the share positions 0..n)
    fn subset_params() -> impl Strategy<Value = (usize, usize, Vec<usize>)> {
        (1usize..=20)
            .prop_flat_map(|n| (Just(n), 1..=n))
            .prop_flat_map(|(n, k)| {
                let positions: Vec<usize> = (0..n).collect();
                (Just(n), Just(k), Just(positions).prop_shuffle())
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_random_subset_reconstructs(
            secret in prop::array::uniform32(any::<u8>()),
            (n, k, order) in subset_params(),
        ) {
            let secret = Felt::from_biguint(&num_bigint::BigUint::from_bytes_be(&secret));
            let shares = split(&secret, k, n).unwrap();

            let picked: Vec<Share> = order.iter().take(k).map(|&i| shares[i].clone()).collect();
            prop_assert_eq!(reconstruct(&picked, k).unwrap(), secret);
        }

        #[test]
        fn prop_fewer_than_k_fails(n in 2usize..=20, k_seed in any::<usize>()) {
            let k = 2 + k_seed % (n - 1);
            let shares = split(&Felt::from(3), k, n).unwrap();
            let result = reconstruct(&shares[..k - 1], k);
            prop_assert_eq!(result, Err(Error::InsufficientShares { have: k - 1, need: k }));
        }
    }
}
