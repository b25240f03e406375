//! which authority holds which share
//!
//! in the threshold-cryptography deployment every authority keeps one
//! share. when a request gathers approvals, the shares of the approving
//! authorities are the ones available for reconstruction.

use std::collections::HashSet;

use crate::quorum::normalize_identity;
use crate::secret::SecretKey;
use crate::share::Share;
use crate::vss;
use crate::{Error, Result};

/// authority -> share mapping, in assignment order
#[derive(Debug, Clone)]
pub struct Custody {
    holders: Vec<(String, Share)>,
}

impl Custody {
    /// hand shares out one per authority, in order
    pub fn assign<I, S>(shares: Vec<Share>, authorities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let authorities: Vec<String> = authorities
            .into_iter()
            .map(|a| normalize_identity(a.as_ref()))
            .collect();

        if authorities.len() != shares.len() {
            return Err(Error::InvalidParameters(format!(
                "expected {} authorities, got {}",
                shares.len(),
                authorities.len()
            )));
        }

        let mut seen = HashSet::new();
        for authority in &authorities {
            if !seen.insert(authority.as_str()) {
                return Err(Error::InvalidParameters(format!(
                    "authority '{}' listed twice",
                    authority
                )));
            }
        }

        Ok(Self {
            holders: authorities.into_iter().zip(shares).collect(),
        })
    }

    /// split a key into one share per authority, any k of which recover it
    pub fn split<I, S>(secret: &SecretKey, k: usize, authorities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let authorities: Vec<S> = authorities.into_iter().collect();
        let shares = vss::split_secret(secret, k, authorities.len())?;
        Self::assign(shares, authorities)
    }

    pub fn share_of(&self, authority: &str) -> Option<&Share> {
        let authority = normalize_identity(authority);
        self.holders
            .iter()
            .find(|(holder, _)| *holder == authority)
            .map(|(_, share)| share)
    }

    /// shares held by `approvers`, in approval order, at most `k`.
    /// identities without a share are skipped.
    pub fn collect<S: AsRef<str>>(&self, approvers: &[S], k: usize) -> Vec<Share> {
        approvers
            .iter()
            .filter_map(|a| self.share_of(a.as_ref()))
            .take(k)
            .cloned()
            .collect()
    }

    /// (authority, share index) pairs, without share values
    pub fn holders(&self) -> impl Iterator<Item = (&str, u32)> {
        self.holders.iter().map(|(a, s)| (a.as_str(), s.index))
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITIES: [&str; 5] = ["A", "B", "C", "D", "E"];

    #[test]
    fn test_split_assigns_in_order() {
        let custody = Custody::split(&SecretKey::from_bytes([1u8; 32]), 3, AUTHORITIES).unwrap();
        let holders: Vec<(&str, u32)> = custody.holders().collect();
        assert_eq!(holders, vec![("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);
    }

    #[test]
    fn test_collect_from_approvers() {
        let key = SecretKey::from_bytes([9u8; 32]);
        let custody = Custody::split(&key, 3, AUTHORITIES).unwrap();

        let shares = custody.collect(&["E", "mallory", "b", "D", "A"], 3);
        let indices: Vec<u32> = shares.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![5, 2, 4]);
        assert_eq!(vss::reconstruct_secret(&shares, 3).unwrap(), key);
    }

    #[test]
    fn test_collect_short() {
        let custody = Custody::split(&SecretKey::from_bytes([9u8; 32]), 3, AUTHORITIES).unwrap();
        assert_eq!(custody.collect(&["A", "B"], 3).len(), 2);
    }

    #[test]
    fn test_assign_count_mismatch() {
        let shares = vss::split_secret(&SecretKey::from_bytes([2u8; 32]), 2, 3).unwrap();
        assert!(matches!(
            Custody::assign(shares, ["A", "B"]),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_assign_duplicate_authority() {
        let shares = vss::split_secret(&SecretKey::from_bytes([2u8; 32]), 2, 2).unwrap();
        assert!(Custody::assign(shares, ["A", "a"]).is_err());
    }
}
