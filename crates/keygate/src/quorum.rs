//! approval quorum per request
//!
//! each request id moves from open (count < threshold) to reached
//! (count >= threshold) and never back: votes are not retracted. only
//! identities on the configured allowlist may vote, and each identity
//! counts once per request no matter how often or how concurrently it
//! calls in.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::QuorumConfig;
use crate::ledger::{Insert, Ledger, MemoryLedger};
use crate::{Error, Result};

/// identifier of one release request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 0x-prefixed sha256 of `file_id:requester:nonce`
    pub fn derive(file_id: &str, requester: &str, nonce: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(file_id.as_bytes());
        hasher.update(b":");
        hasher.update(requester.as_bytes());
        hasher.update(b":");
        hasher.update(nonce.as_bytes());
        Self(format!("0x{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// one approval, unique per (request_id, voter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub request_id: RequestId,
    /// normalized voter identity
    pub voter: String,
    /// unix seconds at record time
    pub timestamp: u64,
}

/// result of a vote attempt by an authorized voter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// vote stored
    Recorded { count: usize, reached: bool },
    /// this voter had already voted; nothing changed
    AlreadyVoted { count: usize },
}

impl VoteOutcome {
    pub fn count(&self) -> usize {
        match self {
            Self::Recorded { count, .. } | Self::AlreadyVoted { count } => *count,
        }
    }
}

/// derived quorum view of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumState {
    pub count: usize,
    pub threshold: usize,
    pub reached: bool,
}

impl QuorumState {
    fn new(count: usize, threshold: usize) -> Self {
        Self {
            count,
            threshold,
            reached: count >= threshold,
        }
    }

    /// progress towards the threshold, may exceed 100
    pub fn percentage(&self) -> u32 {
        if self.count == 0 || self.threshold == 0 {
            return 0;
        }
        u32::try_from(self.count * 100 / self.threshold).unwrap_or(u32::MAX)
    }

    /// votes still missing
    pub fn remaining(&self) -> usize {
        self.threshold.saturating_sub(self.count)
    }
}

/// allowlisted voter with its 1-based position in the config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authority {
    pub index: usize,
    pub identity: String,
}

/// identities compare trimmed and case-insensitive (mixed-case hex
/// wallet addresses are common)
pub(crate) fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// k-of-n approval tracker over a pluggable ledger
pub struct QuorumTracker<L: Ledger = MemoryLedger> {
    ledger: L,
    threshold: usize,
    authorities: Vec<String>,
}

impl QuorumTracker<MemoryLedger> {
    /// tracker backed by a fresh in-memory ledger
    pub fn new(config: &QuorumConfig) -> Result<Self> {
        Self::with_ledger(config, MemoryLedger::new())
    }
}

impl<L: Ledger> QuorumTracker<L> {
    pub fn with_ledger(config: &QuorumConfig, ledger: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            threshold: config.threshold,
            authorities: config.authorities.iter().map(|a| normalize_identity(a)).collect(),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn is_authority(&self, voter: &str) -> bool {
        let voter = normalize_identity(voter);
        self.authorities.iter().any(|a| *a == voter)
    }

    /// allowlist in configured order
    pub fn authorities(&self) -> Vec<Authority> {
        self.authorities
            .iter()
            .enumerate()
            .map(|(i, identity)| Authority {
                index: i + 1,
                identity: identity.clone(),
            })
            .collect()
    }

    /// record an approval from `voter` for `request_id`
    ///
    /// a repeated vote is `AlreadyVoted`, not an error. voters outside
    /// the allowlist get `UnauthorizedVoter`; closed requests get
    /// `RequestClosed`.
    pub fn cast_vote(&self, request_id: &RequestId, voter: &str) -> Result<VoteOutcome> {
        let voter = normalize_identity(voter);
        if !self.authorities.contains(&voter) {
            warn!(request_id = %request_id, voter = %voter, "vote from unauthorized identity");
            return Err(Error::UnauthorizedVoter(voter));
        }

        let record = VoteRecord {
            request_id: request_id.clone(),
            voter: voter.clone(),
            timestamp: unix_now(),
        };

        match self.ledger.record(record)? {
            Insert::Recorded { count } => {
                let reached = count >= self.threshold;
                debug!(
                    request_id = %request_id,
                    voter = %voter,
                    count,
                    threshold = self.threshold,
                    reached,
                    "vote recorded"
                );
                Ok(VoteOutcome::Recorded { count, reached })
            }
            Insert::Duplicate { count } => {
                debug!(request_id = %request_id, voter = %voter, count, "duplicate vote ignored");
                Ok(VoteOutcome::AlreadyVoted { count })
            }
            Insert::Closed => {
                warn!(request_id = %request_id, voter = %voter, "vote after request was closed");
                Err(Error::RequestClosed(request_id.to_string()))
            }
        }
    }

    /// current quorum view; reads only
    pub fn status(&self, request_id: &RequestId) -> Result<QuorumState> {
        let count = self.ledger.count(request_id)?;
        Ok(QuorumState::new(count, self.threshold))
    }

    /// voters on record in first-vote order
    pub fn approvers(&self, request_id: &RequestId) -> Result<Vec<String>> {
        Ok(self
            .ledger
            .records(request_id)?
            .into_iter()
            .map(|r| r.voter)
            .collect())
    }

    /// end the approval window for a request
    pub fn close(&self, request_id: &RequestId) -> Result<()> {
        debug!(request_id = %request_id, "request closed for voting");
        self.ledger.close(request_id)
    }
}
