//! memory ledger - process-local vote storage
//!
//! one write lock covers the duplicate check and the insert, which is
//! what keeps concurrent votes from the same voter from double counting.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ledger::{Insert, Ledger};
use crate::quorum::{RequestId, VoteRecord};
use crate::{Error, Result};

#[derive(Default)]
struct RequestEntry {
    records: Vec<VoteRecord>,
    closed: bool,
}

/// in-memory ledger, cheap to clone (shared state)
///
/// entries are never evicted, so closed and abandoned requests stay in
/// the map for the life of the ledger. long-running processes rotate to
/// a fresh ledger (and tracker) or plug in a persistent `Ledger`.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    requests: Arc<RwLock<HashMap<RequestId, RequestEntry>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of requests with any state
    pub fn len(&self) -> Result<usize> {
        let requests = self.requests.read().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(requests.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Ledger for MemoryLedger {
    fn record(&self, record: VoteRecord) -> Result<Insert> {
        let mut requests = self.requests.write().map_err(|e| Error::Storage(e.to_string()))?;
        let entry = requests.entry(record.request_id.clone()).or_default();

        if entry.closed {
            return Ok(Insert::Closed);
        }

        if entry.records.iter().any(|r| r.voter == record.voter) {
            return Ok(Insert::Duplicate {
                count: entry.records.len(),
            });
        }

        entry.records.push(record);
        Ok(Insert::Recorded {
            count: entry.records.len(),
        })
    }

    fn count(&self, request_id: &RequestId) -> Result<usize> {
        let requests = self.requests.read().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(requests.get(request_id).map_or(0, |e| e.records.len()))
    }

    fn records(&self, request_id: &RequestId) -> Result<Vec<VoteRecord>> {
        let requests = self.requests.read().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(requests
            .get(request_id)
            .map(|e| e.records.clone())
            .unwrap_or_default())
    }

    fn close(&self, request_id: &RequestId) -> Result<()> {
        let mut requests = self.requests.write().map_err(|e| Error::Storage(e.to_string()))?;
        requests.entry(request_id.clone()).or_default().closed = true;
        Ok(())
    }

    fn is_closed(&self, request_id: &RequestId) -> Result<bool> {
        let requests = self.requests.read().map_err(|e| Error::Storage(e.to_string()))?;
        Ok(requests.get(request_id).is_some_and(|e| e.closed))
    }
}
