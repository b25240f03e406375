//! ledger trait and implementations
//!
//! a ledger is a pluggable backend that stores approval votes per request.
//! the ledger is responsible for:
//! - recording at most one vote per (request, voter)
//! - doing the duplicate check and the insert as one atomic step
//! - remembering which requests no longer accept votes
//!
//! implementations:
//! - memory: process-local, lock-protected map

pub mod memory;

use crate::quorum::{RequestId, VoteRecord};
use crate::Result;

/// result of an atomic insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// new vote stored, count after insert
    Recorded { count: usize },
    /// voter already on record, count unchanged
    Duplicate { count: usize },
    /// request no longer accepts votes
    Closed,
}

/// ledger trait - pluggable backend for vote records
///
/// votes are never retracted: per-request counts only grow, and there is
/// no operation that removes a stored vote.
pub trait Ledger: Send + Sync {
    /// insert a vote unless that voter already has one for the request
    fn record(&self, record: VoteRecord) -> Result<Insert>;

    /// number of distinct voters for a request (0 if never seen)
    fn count(&self, request_id: &RequestId) -> Result<usize>;

    /// stored votes in the order they were recorded
    fn records(&self, request_id: &RequestId) -> Result<Vec<VoteRecord>>;

    /// stop accepting votes for a request
    fn close(&self, request_id: &RequestId) -> Result<()>;

    /// whether a request was closed
    fn is_closed(&self, request_id: &RequestId) -> Result<bool>;
}

pub use memory::MemoryLedger;
