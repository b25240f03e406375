//! lagrange interpolation at x = 0
//!
//! for a set Q of distinct non-zero indices the basis coefficient of i is
//!
//! λ_i = Π_{j ∈ Q, j ≠ i} (-j) / (i - j)
//!
//! and the secret is Σ_i λ_i · y_i. numerators and denominators are
//! accumulated separately and every denominator is inverted explicitly,
//! so a zero denominator surfaces as an error instead of a wrong value.

use crate::field::Felt;
use crate::{Error, Result};

/// basis coefficients λ_i for the given indices, in input order
pub fn coefficients_at_zero(indices: &[u32]) -> Result<Vec<Felt>> {
    if indices.is_empty() {
        return Err(Error::InsufficientShares { have: 0, need: 1 });
    }

    for &idx in indices {
        if idx == 0 {
            return Err(Error::InvalidParameters("share index must be non-zero".into()));
        }
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(Error::DuplicateIndex(pair[0]));
        }
    }

    let xs: Vec<Felt> = indices.iter().map(|&i| Felt::from(u64::from(i))).collect();

    let mut coeffs = Vec::with_capacity(xs.len());
    for (i, xi) in xs.iter().enumerate() {
        let mut num = Felt::one();
        let mut den = Felt::one();
        for (j, xj) in xs.iter().enumerate() {
            if i != j {
                num = num.mul(&xj.neg());
                den = den.mul(&xi.sub(xj));
            }
        }
        coeffs.push(num.mul(&den.modinv()?));
    }

    Ok(coeffs)
}

/// interpolate f(0) from points (x_i, f(x_i))
pub fn interpolate_at_zero(points: &[(u32, Felt)]) -> Result<Felt> {
    let indices: Vec<u32> = points.iter().map(|(x, _)| *x).collect();
    let coeffs = coefficients_at_zero(&indices)?;

    Ok(points
        .iter()
        .zip(coeffs.iter())
        .fold(Felt::zero(), |acc, ((_, y), l)| acc.add(&y.mul(l))))
}
