//! two-gate key release
//!
//! a key leaves only if both gates pass:
//! 1. policy: the requester's attributes satisfy the file policy
//! 2. quorum: enough distinct authorities approved this request id
//!
//! then the key is fetched according to the strategy chosen when the
//! orchestrator was built:
//! - approval: key is stored whole and returned as is
//! - shared: key is reconstructed from k shamir shares
//!
//! the gates are checked in that order and independently. a policy
//! failure never looks at votes, and failing to produce the key after
//! both gates passed is reported separately from a gate failure.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::custody::Custody;
use crate::ledger::{Ledger, MemoryLedger};
use crate::policy::{self, AttributeSet};
use crate::quorum::{QuorumTracker, RequestId};
use crate::secret::SecretKey;
use crate::share::Share;
use crate::vss;
use crate::{Error, Result};

/// how the protected key is obtained once both gates pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStrategy {
    /// key stored whole, approvals alone gate it
    Approval,
    /// key split into shares, `threshold` of them rebuild it
    Shared { threshold: usize },
}

impl fmt::Display for ReleaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approval => write!(f, "approval"),
            Self::Shared { threshold } => write!(f, "shared({})", threshold),
        }
    }
}

/// where the key for one request comes from
pub enum SecretSource<'a> {
    /// the whole key
    Stored(SecretKey),
    /// shares supplied by the caller; the first k are used
    Shares(Vec<Share>),
    /// shares held by the authorities that approved the request
    Custody(&'a Custody),
}

impl SecretSource<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Stored(_) => "stored",
            Self::Shares(_) => "shares",
            Self::Custody(_) => "custody",
        }
    }
}

/// why a release was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// attributes do not satisfy the policy; no key was sought
    PolicyNotSatisfied,
    /// quorum not reached; no key was sought
    InsufficientApprovals,
    /// both gates passed but the key could not be produced
    KeyUnavailable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolicyNotSatisfied => write!(f, "attributes do not satisfy policy"),
            Self::InsufficientApprovals => write!(f, "approval threshold not reached"),
            Self::KeyUnavailable => write!(f, "key could not be obtained"),
        }
    }
}

/// outcome of one release attempt, computed fresh every time
#[derive(Debug)]
pub struct ReleaseDecision {
    pub authorized: bool,
    pub reason: Option<DenialReason>,
    pub secret: Option<SecretKey>,
}

impl ReleaseDecision {
    fn granted(secret: SecretKey) -> Self {
        Self {
            authorized: true,
            reason: None,
            secret: Some(secret),
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self {
            authorized: false,
            reason: Some(reason),
            secret: None,
        }
    }

    /// take the key out, consuming the decision
    pub fn into_secret(self) -> Option<SecretKey> {
        self.secret
    }
}

/// release orchestrator
pub struct KeyRelease<L: Ledger = MemoryLedger> {
    quorum: QuorumTracker<L>,
    strategy: ReleaseStrategy,
}

impl<L: Ledger> KeyRelease<L> {
    pub fn new(quorum: QuorumTracker<L>, strategy: ReleaseStrategy) -> Result<Self> {
        if let ReleaseStrategy::Shared { threshold: 0 } = strategy {
            return Err(Error::InvalidParameters("share threshold must be at least 1".into()));
        }
        Ok(Self { quorum, strategy })
    }

    /// approvals gate a whole stored key
    pub fn approval(quorum: QuorumTracker<L>) -> Self {
        Self {
            quorum,
            strategy: ReleaseStrategy::Approval,
        }
    }

    /// approvals gate reconstruction from `threshold` shares
    pub fn shared(quorum: QuorumTracker<L>, threshold: usize) -> Result<Self> {
        Self::new(quorum, ReleaseStrategy::Shared { threshold })
    }

    pub fn quorum(&self) -> &QuorumTracker<L> {
        &self.quorum
    }

    pub fn strategy(&self) -> ReleaseStrategy {
        self.strategy
    }

    /// run both gates and, if they pass, produce the key
    ///
    /// denials are data in the decision. `Err` is reserved for the vote
    /// ledger itself failing.
    pub fn authorize_and_release(
        &self,
        policy: &str,
        attributes: &AttributeSet,
        request_id: &RequestId,
        source: SecretSource<'_>,
    ) -> Result<ReleaseDecision> {
        if !policy::satisfies(policy, attributes) {
            warn!(
                request_id = %request_id,
                strategy = %self.strategy,
                "release denied: policy not satisfied"
            );
            return Ok(ReleaseDecision::denied(DenialReason::PolicyNotSatisfied));
        }

        let quorum = self.quorum.status(request_id)?;
        if !quorum.reached {
            warn!(
                request_id = %request_id,
                strategy = %self.strategy,
                count = quorum.count,
                threshold = quorum.threshold,
                "release denied: insufficient approvals"
            );
            return Ok(ReleaseDecision::denied(DenialReason::InsufficientApprovals));
        }

        let source_kind = source.kind();
        match self.obtain(request_id, source) {
            Ok(secret) => {
                info!(
                    request_id = %request_id,
                    strategy = %self.strategy,
                    source = source_kind,
                    approvals = quorum.count,
                    "key released"
                );
                Ok(ReleaseDecision::granted(secret))
            }
            Err(Error::Storage(e)) => Err(Error::Storage(e)),
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    strategy = %self.strategy,
                    source = source_kind,
                    error = %e,
                    "release denied: key unavailable"
                );
                Ok(ReleaseDecision::denied(DenialReason::KeyUnavailable))
            }
        }
    }

    fn obtain(&self, request_id: &RequestId, source: SecretSource<'_>) -> Result<SecretKey> {
        match (self.strategy, source) {
            (ReleaseStrategy::Approval, SecretSource::Stored(secret)) => Ok(secret),
            (ReleaseStrategy::Shared { threshold }, SecretSource::Shares(shares)) => {
                vss::reconstruct_secret(&shares, threshold)
            }
            (ReleaseStrategy::Shared { threshold }, SecretSource::Custody(custody)) => {
                let approvers = self.quorum.approvers(request_id)?;
                let shares = custody.collect(&approvers, threshold);
                vss::reconstruct_secret(&shares, threshold)
            }
            (strategy, source) => Err(Error::InvalidParameters(format!(
                "{} source cannot serve {} release",
                source.kind(),
                strategy
            ))),
        }
    }
}
