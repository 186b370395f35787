//! Resource Registry - registered pools, supply, pricing, freeze state
//!
//! Stores every registered resource pool plus its bounded price-history
//! log. Pools are registered once (immutable id) and never deleted; a
//! misbehaving pool is frozen instead.
//!
//! All mutations follow validate-then-apply: a failed call leaves the
//! registry untouched.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core_types::{Amount, ResourceId, Timestamp};
use crate::error::{EngineError, EngineResult};

/// Price history capacity per resource. Oldest entries are evicted first.
pub const PRICE_HISTORY_CAP: usize = 10;

/// Maximum number of dependency links per resource.
pub const DEPENDENCY_CAP: usize = 5;

/// Maximum accepted resource name length in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// One superseded price, recorded when the price changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Amount,
    pub recorded_at: Timestamp,
}

/// A registered resource pool.
///
/// # Invariants (enforced by this module):
/// - `available_supply <= total_supply` always
/// - `0 < min_allocation < max_allocation <= total_supply`
/// - `price_history` holds at most [`PRICE_HISTORY_CAP`] entries,
///   most recent first
/// - `dependencies` holds at most [`DEPENDENCY_CAP`] distinct ids,
///   never the resource's own id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: ResourceId,
    pub name: String,
    pub total_supply: Amount,
    pub available_supply: Amount,
    pub price_per_unit: Amount,
    pub frozen: bool,
    /// Minimum requester priority (0 admits everyone, 5 admins only).
    pub required_priority: u8,
    pub min_allocation: Amount,
    pub max_allocation: Amount,
    pub price_history: VecDeque<PricePoint>,
    pub last_price_update: Timestamp,
    pub dependencies: Vec<ResourceId>,
}

/// Registry of all resource pools, keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRegistry {
    resources: FxHashMap<ResourceId, ResourceType>,
    /// Upper bound for any supply or price figure accepted at
    /// registration or repricing. Guards against fat-finger entries.
    quantity_ceiling: Amount,
}

impl ResourceRegistry {
    pub fn new(quantity_ceiling: Amount) -> Self {
        Self {
            resources: FxHashMap::default(),
            quantity_ceiling,
        }
    }

    // ============================================================
    // QUERY OPERATIONS (Read-Only)
    // ============================================================

    #[inline]
    pub fn get(&self, id: ResourceId) -> Option<&ResourceType> {
        self.resources.get(&id)
    }

    /// Lookup that maps absence to the engine error.
    pub fn require(&self, id: ResourceId) -> EngineResult<&ResourceType> {
        self.resources
            .get(&id)
            .ok_or(EngineError::ResourceNotFound(id))
    }

    pub fn price_history(&self, id: ResourceId) -> EngineResult<&VecDeque<PricePoint>> {
        Ok(&self.require(id)?.price_history)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    // ============================================================
    // REGISTRATION
    // ============================================================

    /// Register a new pool. One-time per id.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        id: ResourceId,
        name: &str,
        total_supply: Amount,
        price_per_unit: Amount,
        min_allocation: Amount,
        max_allocation: Amount,
        required_priority: u8,
        now: Timestamp,
    ) -> EngineResult<()> {
        if self.resources.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(EngineError::InvalidParameter(format!(
                "resource name must be 1..={} bytes",
                MAX_NAME_LEN
            )));
        }
        if total_supply == 0 || total_supply > self.quantity_ceiling {
            return Err(EngineError::InvalidQuantity(format!(
                "total_supply must be in 1..={}",
                self.quantity_ceiling
            )));
        }
        if price_per_unit == 0 || price_per_unit > self.quantity_ceiling {
            return Err(EngineError::InvalidQuantity(format!(
                "price_per_unit must be in 1..={}",
                self.quantity_ceiling
            )));
        }
        if required_priority > 5 {
            return Err(EngineError::InvalidParameter(
                "required_priority must be <= 5".into(),
            ));
        }
        if min_allocation == 0 {
            return Err(EngineError::InvalidParameter(
                "min_allocation must be >= 1".into(),
            ));
        }
        if max_allocation <= min_allocation {
            return Err(EngineError::InvalidParameter(
                "max_allocation must exceed min_allocation".into(),
            ));
        }
        if max_allocation > total_supply {
            return Err(EngineError::InvalidParameter(
                "max_allocation must not exceed total_supply".into(),
            ));
        }

        self.resources.insert(
            id,
            ResourceType {
                id,
                name: name.to_string(),
                total_supply,
                available_supply: total_supply,
                price_per_unit,
                frozen: false,
                required_priority,
                min_allocation,
                max_allocation,
                price_history: VecDeque::with_capacity(PRICE_HISTORY_CAP),
                last_price_update: now,
                dependencies: Vec::new(),
            },
        );
        Ok(())
    }

    // ============================================================
    // MUTATIONS
    // ============================================================

    /// Reprice a pool. The superseded price is pushed to the front of
    /// the bounded history before the new price takes effect.
    pub fn update_price(
        &mut self,
        id: ResourceId,
        new_price: Amount,
        now: Timestamp,
    ) -> EngineResult<()> {
        if new_price == 0 || new_price > self.quantity_ceiling {
            return Err(EngineError::InvalidQuantity(format!(
                "price_per_unit must be in 1..={}",
                self.quantity_ceiling
            )));
        }
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or(EngineError::ResourceNotFound(id))?;

        let old = PricePoint {
            price: resource.price_per_unit,
            recorded_at: resource.last_price_update,
        };
        if resource.price_history.len() == PRICE_HISTORY_CAP {
            resource.price_history.pop_back();
        }
        resource.price_history.push_front(old);
        resource.price_per_unit = new_price;
        resource.last_price_update = now;
        Ok(())
    }

    pub fn freeze(&mut self, id: ResourceId) -> EngineResult<()> {
        self.resources
            .get_mut(&id)
            .ok_or(EngineError::ResourceNotFound(id))?
            .frozen = true;
        Ok(())
    }

    pub fn unfreeze(&mut self, id: ResourceId) -> EngineResult<()> {
        self.resources
            .get_mut(&id)
            .ok_or(EngineError::ResourceNotFound(id))?
            .frozen = false;
        Ok(())
    }

    /// Consume supply on settlement. Invoked by the engine when a
    /// request is approved, never directly by callers.
    pub fn decrease_available(&mut self, id: ResourceId, amount: Amount) -> EngineResult<()> {
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or(EngineError::ResourceNotFound(id))?;
        if amount > resource.available_supply {
            return Err(EngineError::InsufficientBalance {
                need: amount,
                have: resource.available_supply,
            });
        }
        resource.available_supply -= amount;
        Ok(())
    }

    /// Link a dependency. Both pools must exist; a pool cannot depend on
    /// itself; at most [`DEPENDENCY_CAP`] links. Re-adding is a no-op.
    pub fn add_dependency(&mut self, id: ResourceId, depends_on: ResourceId) -> EngineResult<()> {
        if id == depends_on {
            return Err(EngineError::InvalidParameter(
                "resource cannot depend on itself".into(),
            ));
        }
        if !self.resources.contains_key(&depends_on) {
            return Err(EngineError::ResourceNotFound(depends_on));
        }
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or(EngineError::ResourceNotFound(id))?;
        if resource.dependencies.contains(&depends_on) {
            return Ok(());
        }
        if resource.dependencies.len() == DEPENDENCY_CAP {
            return Err(EngineError::InvalidParameter(format!(
                "resource {} already has {} dependencies",
                id, DEPENDENCY_CAP
            )));
        }
        resource.dependencies.push(depends_on);
        Ok(())
    }
}
