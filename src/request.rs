//! Allocation Requests - the request record and its status machine
//!
//! A request is a claim on resource supply with a bounded lifetime.
//! Status machine: `Pending -> {Approved, Rejected, Expired}`; terminal
//! states are final and requests are never physically deleted - the book
//! is the audit trail.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core_types::{Amount, Principal, RequestId, ResourceId, Timestamp};
use crate::error::{EngineError, EngineResult};

/// Maximum accepted justification length in bytes.
pub const MAX_JUSTIFICATION_LEN: usize = 256;

/// Lifecycle status of an allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    /// Admitted, awaiting settlement or expiry.
    Pending,
    /// Settled: supply decremented, requester credited.
    Approved,
    /// Declined by the administrator. No accounting effects.
    Rejected,
    /// Deadline passed before settlement.
    Expired,
}

impl RequestStatus {
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A recorded allocation request. Only `status` ever mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub id: RequestId,
    pub requester: Principal,
    pub resource_id: ResourceId,
    pub amount: Amount,
    pub status: RequestStatus,
    /// Requester's priority level captured at submission; later role
    /// changes do not retroactively affect the request.
    pub priority_at_submission: u8,
    pub submitted_at: Timestamp,
    pub expires_at: Timestamp,
    pub justification: String,
}

impl AllocationRequest {
    /// Move out of Pending. Terminal states are final; a second
    /// transition fails and changes nothing.
    pub fn transition(&mut self, to: RequestStatus) -> EngineResult<()> {
        if self.status.is_terminal() {
            return Err(EngineError::InvalidParameter(format!(
                "request {} already settled as {:?}",
                self.id, self.status
            )));
        }
        self.status = to;
        Ok(())
    }

    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// The request book: every request ever admitted, plus the id counter.
///
/// Id assignment and record insertion happen in one step so ids are
/// strictly increasing in submission order with no gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBook {
    requests: FxHashMap<RequestId, AllocationRequest>,
    next_id: RequestId,
}

impl Default for RequestBook {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBook {
    pub fn new() -> Self {
        Self {
            requests: FxHashMap::default(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn get(&self, id: RequestId) -> Option<&AllocationRequest> {
        self.requests.get(&id)
    }

    pub fn get_mut(&mut self, id: RequestId) -> EngineResult<&mut AllocationRequest> {
        self.requests
            .get_mut(&id)
            .ok_or(EngineError::RequestNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Admit a fully validated request: assign the next id and record it
    /// as Pending in the same step.
    #[allow(clippy::too_many_arguments)]
    pub fn admit(
        &mut self,
        requester: Principal,
        resource_id: ResourceId,
        amount: Amount,
        priority_at_submission: u8,
        justification: String,
        submitted_at: Timestamp,
        expires_at: Timestamp,
    ) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.requests.insert(
            id,
            AllocationRequest {
                id,
                requester,
                resource_id,
                amount,
                status: RequestStatus::Pending,
                priority_at_submission,
                submitted_at,
                expires_at,
                justification,
            },
        );
        id
    }

    /// Restart the id sequence. Only `initialize` calls this.
    pub(crate) fn reset_counter(&mut self) {
        self.next_id = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(id: &str) -> Principal {
        Principal::new(id).unwrap()
    }

    fn admit_one(book: &mut RequestBook, who: &str) -> RequestId {
        book.admit(acct(who), 1, 50, 1, "batch import".into(), 1000, 1000 + 86_400)
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut book = RequestBook::new();
        assert_eq!(admit_one(&mut book, "alice"), 1);
        assert_eq!(admit_one(&mut book, "bob"), 2);
        assert_eq!(admit_one(&mut book, "alice"), 3);
    }

    #[test]
    fn test_default_book_starts_at_one_too() {
        let mut book = RequestBook::default();
        assert_eq!(admit_one(&mut book, "alice"), 1);
    }

    #[test]
    fn test_admitted_request_is_pending() {
        let mut book = RequestBook::new();
        let id = admit_one(&mut book, "alice");
        let req = book.get(id).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.amount, 50);
        assert_eq!(req.expires_at, req.submitted_at + 86_400);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut book = RequestBook::new();
        let id = admit_one(&mut book, "alice");

        book.get_mut(id)
            .unwrap()
            .transition(RequestStatus::Approved)
            .unwrap();

        let err = book
            .get_mut(id)
            .unwrap()
            .transition(RequestStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter(_)));
        assert_eq!(book.get(id).unwrap().status, RequestStatus::Approved);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let mut book = RequestBook::new();
        let id = admit_one(&mut book, "alice");
        let req = book.get(id).unwrap();
        // Not expired AT the deadline, only after it.
        assert!(!req.is_expired_at(req.expires_at));
        assert!(req.is_expired_at(req.expires_at + 1));
    }

    #[test]
    fn test_missing_request_lookup() {
        let mut book = RequestBook::new();
        assert!(book.get(7).is_none());
        assert_eq!(book.get_mut(7).unwrap_err(), EngineError::RequestNotFound(7));
    }
}
