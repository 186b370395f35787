//! Allocation Ledger - per-account balances and allocation history
//!
//! Balances are keyed by `(account, resource)` so holdings in different
//! pools never mix. Accounts are created lazily on first credit or
//! history entry and never deleted.
//!
//! Mutations are checked and all-or-nothing: a failed transfer leaves
//! both sides untouched.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core_types::{Amount, Principal, RequestId, ResourceId};
use crate::error::{EngineError, EngineResult};

/// Allocation history capacity per account, most recent first.
pub const ALLOCATION_HISTORY_CAP: usize = 10;

/// Per-account resource balances plus bounded allocation-history logs.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AllocationLedger {
    balances: FxHashMap<Principal, FxHashMap<ResourceId, Amount>>,
    history: FxHashMap<Principal, VecDeque<RequestId>>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================
    // QUERY OPERATIONS (Read-Only)
    // ============================================================

    /// Balance of one account in one pool. Missing entries read as 0.
    #[inline]
    pub fn balance_of(&self, account: &Principal, resource: ResourceId) -> Amount {
        self.balances
            .get(account)
            .and_then(|per_resource| per_resource.get(&resource))
            .copied()
            .unwrap_or(0)
    }

    /// All non-zero balances of an account, keyed by resource.
    pub fn balances_of(&self, account: &Principal) -> FxHashMap<ResourceId, Amount> {
        self.balances.get(account).cloned().unwrap_or_default()
    }

    /// Allocation history of an account, most recent request id first.
    pub fn history_of(&self, account: &Principal) -> Vec<RequestId> {
        self.history
            .get(account)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Sum of every balance across all accounts and pools. Used by the
    /// conservation checks; not part of the public API surface.
    pub fn total_balance(&self) -> Amount {
        self.balances
            .values()
            .flat_map(|per_resource| per_resource.values())
            .sum()
    }

    // ============================================================
    // MUTATIONS
    // ============================================================

    /// Credit an account, creating the slot on first use.
    pub fn credit(
        &mut self,
        account: &Principal,
        resource: ResourceId,
        amount: Amount,
    ) -> EngineResult<()> {
        let slot = self
            .balances
            .entry(account.clone())
            .or_default()
            .entry(resource)
            .or_insert(0);
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidQuantity("balance overflow".into()))?;
        Ok(())
    }

    /// Debit an account. Fails without mutation when the balance is
    /// insufficient.
    pub fn debit(
        &mut self,
        account: &Principal,
        resource: ResourceId,
        amount: Amount,
    ) -> EngineResult<()> {
        let have = self.balance_of(account, resource);
        if have < amount {
            return Err(EngineError::InsufficientBalance {
                need: amount,
                have,
            });
        }
        // Checked above; the entry must exist for have > 0, and for
        // amount == 0 the or_insert path is harmless.
        let slot = self
            .balances
            .entry(account.clone())
            .or_default()
            .entry(resource)
            .or_insert(0);
        *slot -= amount;
        Ok(())
    }

    /// Move `amount` of one resource between two accounts atomically.
    /// Balance-conserving: sender loses exactly what the recipient gains.
    pub fn transfer(
        &mut self,
        sender: &Principal,
        recipient: &Principal,
        resource: ResourceId,
        amount: Amount,
    ) -> EngineResult<()> {
        let have = self.balance_of(sender, resource);
        if have < amount {
            return Err(EngineError::InsufficientBalance {
                need: amount,
                have,
            });
        }
        self.balance_of(recipient, resource)
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidQuantity("balance overflow".into()))?;

        // Both sides validated; apply without further fallible steps.
        self.debit(sender, resource, amount)?;
        self.credit(recipient, resource, amount)?;
        Ok(())
    }

    /// Record a submitted request id at the front of the account's
    /// bounded history, evicting the oldest entry past capacity.
    pub fn record_allocation(&mut self, account: &Principal, request_id: RequestId) {
        let log = self.history.entry(account.clone()).or_default();
        if log.len() == ALLOCATION_HISTORY_CAP {
            log.pop_back();
        }
        log.push_front(request_id);
    }
}
