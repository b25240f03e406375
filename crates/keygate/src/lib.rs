//! # keygate
//!
//! releases a symmetric file key only after two independent checks pass:
//! an attribute policy over the requester, and a k-of-n quorum of
//! authority approvals for the specific request.
//!
//! ## architecture
//!
//! ```text
//!   requester attributes        authority votes
//!            │                         │
//!            ▼                         ▼
//!    ┌───────────────┐        ┌─────────────────┐
//!    │ policy (AND/OR)│        │ quorum tracker  │  (4-of-7 by default)
//!    └───────┬───────┘        └────────┬────────┘
//!            │   both must pass        │
//!            └──────────┬──────────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │   key release   │
//!              └────────┬────────┘
//!             stored    │    shared
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!    whole key                shamir shares over
//!                             secp256k1 base field
//!                             (k-of-n lagrange)
//! ```
//!
//! ## properties
//!
//! - policy failure is decided before votes are looked at
//! - each authority counts once per request, even under concurrent votes
//! - any k of n shares rebuild the key; fewer than k is an error
//! - "gates passed but key unavailable" is its own denial reason
//!
//! ## usage
//!
//! ```rust,ignore
//! use keygate::{AttributeSet, KeyRelease, QuorumConfig, QuorumTracker, RequestId, SecretSource, vss};
//!
//! let quorum = QuorumTracker::new(&QuorumConfig::default())?;
//! let release = KeyRelease::shared(quorum, 4)?;
//!
//! let key = keygate::SecretKey::generate();
//! let shares = vss::split_secret(&key, 4, 7)?;
//!
//! let rid = RequestId::new("r1");
//! for voter in ["authority-1", "authority-2", "authority-3", "authority-4"] {
//!     release.quorum().cast_vote(&rid, voter)?;
//! }
//!
//! let attrs = AttributeSet::from_tokens(["role:admin"]);
//! let decision = release.authorize_and_release("role:admin", &attrs, &rid, SecretSource::Shares(shares))?;
//! assert!(decision.authorized);
//! ```

pub mod config;
pub mod custody;
pub mod error;
pub mod field;
pub mod lagrange;
pub mod ledger;
pub mod policy;
pub mod quorum;
pub mod release;
pub mod secret;
pub mod share;
pub mod vss;

pub use config::{Config, QuorumConfig, SharingConfig};
pub use custody::Custody;
pub use error::{Error, Result};
pub use field::Felt;
pub use ledger::{Ledger, MemoryLedger};
pub use policy::{evaluate_policy, satisfies, Attribute, AttributeSet, Policy};
pub use quorum::{QuorumState, QuorumTracker, RequestId, VoteOutcome, VoteRecord};
pub use release::{DenialReason, KeyRelease, ReleaseDecision, ReleaseStrategy, SecretSource};
pub use secret::SecretKey;
pub use share::Share;
pub use vss::{reconstruct_secret, split_secret};
