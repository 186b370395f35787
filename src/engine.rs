//! QuotaEngine - the single-threaded allocation core
//!
//! One service owns ALL mutable state: system switches, account
//! directory, resource registry, allocation ledger and the request book.
//! Every public operation runs start-to-finish on `&mut self`, which
//! gives the serial execution model the accounting invariants assume:
//! no two mutations interleave, and each call either fully commits or
//! fails with state untouched.
//!
//! # Data Flow
//!
//! ```text
//! caller op → system gates → directory auth → registry read
//!                                   ↓
//!                     ledger / request book mutation
//! ```
//!
//! Validation always completes before the first mutation (the
//! `pre_check`-then-mutate discipline), so rejected operations never
//! consume a request id or move a unit of supply.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core_types::{now_ts, Amount, Principal, RequestId, ResourceId, Timestamp};
use crate::directory::{AccountDirectory, Role};
use crate::error::{EngineError, EngineResult};
use crate::ledger::AllocationLedger;
use crate::registry::{PricePoint, ResourceRegistry, ResourceType};
use crate::request::{AllocationRequest, RequestBook, RequestStatus, MAX_JUSTIFICATION_LEN};
use crate::system::{SystemState, SystemStatus};

/// Time source for the engine. Injectable so deadline behavior is
/// drivable in tests without touching recorded requests.
pub type ClockFn = Box<dyn Fn() -> Timestamp + Send + Sync>;

/// The allocation and quota-management core service.
pub struct QuotaEngine {
    admin: Principal,
    expiry_window: u64,
    clock: ClockFn,
    system: SystemState,
    directory: AccountDirectory,
    registry: ResourceRegistry,
    ledger: AllocationLedger,
    book: RequestBook,
}

impl QuotaEngine {
    /// Build an uninitialized engine from config, on the wall clock.
    /// Mutating operations stay gated behind `initialize` until the
    /// administrator flips the latch.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        Self::with_clock(config, Box::new(now_ts))
    }

    /// Build with an explicit time source.
    pub fn with_clock(config: &EngineConfig, clock: ClockFn) -> EngineResult<Self> {
        let admin = Principal::new(config.admin.clone())
            .map_err(|e| EngineError::InvalidParameter(format!("admin identity: {e}")))?;
        let emergency_contact = Principal::new(config.emergency_contact.clone())
            .map_err(|e| EngineError::InvalidParameter(format!("emergency contact: {e}")))?;
        Ok(Self {
            admin,
            expiry_window: config.expiry_window_secs,
            clock,
            system: SystemState::new(config.global_allocation_ceiling, emergency_contact),
            directory: AccountDirectory::new(),
            registry: ResourceRegistry::new(config.quantity_ceiling),
            ledger: AllocationLedger::new(),
            book: RequestBook::new(),
        })
    }

    #[inline]
    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    #[inline]
    fn ensure_admin(&self, caller: &Principal) -> EngineResult<()> {
        if caller != &self.admin {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }

    // ============================================================
    // SYSTEM CONTROLLER (administrative)
    // ============================================================

    /// One-time activation: flips the latch, clears the global switches
    /// and restarts the request id sequence.
    pub fn initialize(&mut self, caller: &Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.initialize()?;
        self.book.reset_counter();
        info!(admin = %self.admin, "engine initialized");
        Ok(())
    }

    pub fn update_parameters(
        &mut self,
        caller: &Principal,
        new_ceiling: Amount,
        emergency_contact: Principal,
    ) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.system.update_parameters(new_ceiling, emergency_contact)?;
        info!(ceiling = new_ceiling, "system parameters updated");
        Ok(())
    }

    pub fn enter_maintenance(&mut self, caller: &Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.system.enter_maintenance();
        warn!("maintenance mode entered, allocations frozen");
        Ok(())
    }

    pub fn exit_maintenance(&mut self, caller: &Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.system.exit_maintenance();
        info!("maintenance mode cleared");
        Ok(())
    }

    /// Hand the administrator identity to another principal. Replaces
    /// the reference system's fixed deployer-is-admin pattern.
    pub fn rotate_admin(&mut self, caller: &Principal, new_admin: Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        warn!(old = %self.admin, new = %new_admin, "administrator rotated");
        self.admin = new_admin;
        Ok(())
    }

    // ============================================================
    // ACCOUNT DIRECTORY (administrative)
    // ============================================================

    pub fn set_role(
        &mut self,
        caller: &Principal,
        account: Principal,
        role: Role,
    ) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        info!(account = %account, role = role.as_str(), "role assigned");
        self.directory.set_role(account, role);
        Ok(())
    }

    pub fn restrict(&mut self, caller: &Principal, account: Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        if account == self.admin {
            return Err(EngineError::InvalidParameter(
                "cannot restrict the administrator".into(),
            ));
        }
        warn!(account = %account, "account restricted");
        self.directory.restrict(account);
        Ok(())
    }

    pub fn unrestrict(&mut self, caller: &Principal, account: &Principal) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        info!(account = %account, "account restriction lifted");
        self.directory.unrestrict(account);
        Ok(())
    }

    // ============================================================
    // RESOURCE REGISTRY (administrative)
    // ============================================================

    #[allow(clippy::too_many_arguments)]
    pub fn register_resource(
        &mut self,
        caller: &Principal,
        id: ResourceId,
        name: &str,
        total_supply: Amount,
        price_per_unit: Amount,
        min_allocation: Amount,
        max_allocation: Amount,
        required_priority: u8,
    ) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.registry.register(
            id,
            name,
            total_supply,
            price_per_unit,
            min_allocation,
            max_allocation,
            required_priority,
            self.now(),
        )?;
        info!(
            resource = id,
            name, total_supply, price_per_unit, "resource registered"
        );
        Ok(())
    }

    pub fn update_price(
        &mut self,
        caller: &Principal,
        id: ResourceId,
        new_price: Amount,
    ) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.registry.update_price(id, new_price, self.now())?;
        info!(resource = id, price = new_price, "resource repriced");
        Ok(())
    }

    pub fn freeze_resource(&mut self, caller: &Principal, id: ResourceId) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.registry.freeze(id)?;
        warn!(resource = id, "resource frozen");
        Ok(())
    }

    pub fn unfreeze_resource(&mut self, caller: &Principal, id: ResourceId) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.registry.unfreeze(id)?;
        info!(resource = id, "resource unfrozen");
        Ok(())
    }

    pub fn add_dependency(
        &mut self,
        caller: &Principal,
        id: ResourceId,
        depends_on: ResourceId,
    ) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.registry.add_dependency(id, depends_on)
    }

    // ============================================================
    // ALLOCATION REQUESTS (account-facing)
    // ============================================================

    /// The admission pipeline. Ordered checks, first failure wins; a
    /// request id is assigned only after every check passes.
    pub fn submit_allocation_request(
        &mut self,
        requester: &Principal,
        resource_id: ResourceId,
        amount: Amount,
        justification: &str,
    ) -> EngineResult<RequestId> {
        self.system.assert_initialized()?;
        // 1. Global switches
        self.system.assert_open()?;
        // 2. Requester standing
        if !self.directory.is_authorized(requester) {
            return Err(EngineError::Unauthorized);
        }
        // 3. Pool exists and accepts requests
        let resource = self.registry.require(resource_id)?;
        if resource.frozen {
            return Err(EngineError::ResourceFrozen(resource_id));
        }
        // 4. Positive and under the global ceiling
        if amount == 0 {
            return Err(EngineError::InvalidQuantity(
                "amount must be positive".into(),
            ));
        }
        let ceiling = self.system.global_allocation_ceiling();
        if amount > ceiling {
            return Err(EngineError::AllocationExceeded {
                amount,
                limit: ceiling,
            });
        }
        // 5. Supply on hand
        if amount > resource.available_supply {
            return Err(EngineError::InsufficientBalance {
                need: amount,
                have: resource.available_supply,
            });
        }
        // 6. Per-request bounds
        if amount < resource.min_allocation {
            return Err(EngineError::InvalidQuantity(format!(
                "amount below minimum allocation {}",
                resource.min_allocation
            )));
        }
        if amount > resource.max_allocation {
            return Err(EngineError::AllocationExceeded {
                amount,
                limit: resource.max_allocation,
            });
        }
        // 7. Priority gate
        let priority = self.directory.priority_level(requester);
        if priority < resource.required_priority {
            return Err(EngineError::InsufficientPriority {
                have: priority,
                need: resource.required_priority,
            });
        }
        // 8. Justification
        if justification.is_empty() || justification.len() > MAX_JUSTIFICATION_LEN {
            return Err(EngineError::InvalidParameter(format!(
                "justification must be 1..={} bytes",
                MAX_JUSTIFICATION_LEN
            )));
        }

        // Admission: id assignment and record are one atomic step.
        let now = self.now();
        let id = self.book.admit(
            requester.clone(),
            resource_id,
            amount,
            priority,
            justification.to_string(),
            now,
            now + self.expiry_window,
        );
        self.ledger.record_allocation(requester, id);
        info!(
            request = id,
            requester = %requester,
            resource = resource_id,
            amount,
            priority,
            "allocation request admitted"
        );
        Ok(id)
    }

    /// Settle a pending request: consume supply, credit the requester
    /// and mark it Approved, in one atomic step.
    ///
    /// A request whose deadline has passed cannot be approved; it flips
    /// to Expired (lazy expiration) and the call reports the timeout.
    pub fn approve(&mut self, caller: &Principal, request_id: RequestId) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        let now = self.now();

        let req = self.book.get_mut(request_id)?;
        if req.status.is_terminal() {
            return Err(EngineError::InvalidParameter(format!(
                "request {} already settled as {:?}",
                request_id, req.status
            )));
        }
        if req.is_expired_at(now) {
            req.status = RequestStatus::Expired;
            warn!(request = request_id, "approval after deadline, request expired");
            return Err(EngineError::RequestTimeout(request_id));
        }
        let (requester, resource_id, amount) =
            (req.requester.clone(), req.resource_id, req.amount);

        // Validate the credit before touching supply so the settlement
        // is all-or-nothing.
        self.ledger
            .balance_of(&requester, resource_id)
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidQuantity("balance overflow".into()))?;
        self.registry.decrease_available(resource_id, amount)?;
        self.ledger.credit(&requester, resource_id, amount)?;
        self.book.get_mut(request_id)?.transition(RequestStatus::Approved)?;
        info!(
            request = request_id,
            requester = %requester,
            resource = resource_id,
            amount,
            "request approved and settled"
        );
        Ok(())
    }

    /// Decline a pending request. No accounting effects.
    pub fn reject(&mut self, caller: &Principal, request_id: RequestId) -> EngineResult<()> {
        self.ensure_admin(caller)?;
        self.system.assert_initialized()?;
        self.book.get_mut(request_id)?.transition(RequestStatus::Rejected)?;
        info!(request = request_id, "request rejected");
        Ok(())
    }

    /// Flip a pending request past its deadline to Expired. Callable by
    /// anyone; expiration is evaluated lazily, there is no timer.
    pub fn expire(&mut self, request_id: RequestId) -> EngineResult<()> {
        self.system.assert_initialized()?;
        let now = self.now();
        let req = self.book.get_mut(request_id)?;
        if req.status.is_terminal() {
            return Err(EngineError::InvalidParameter(format!(
                "request {} already settled as {:?}",
                request_id, req.status
            )));
        }
        if !req.is_expired_at(now) {
            return Err(EngineError::InvalidParameter(format!(
                "request {} has not reached its deadline",
                request_id
            )));
        }
        req.status = RequestStatus::Expired;
        info!(request = request_id, "request expired");
        Ok(())
    }

    // ============================================================
    // TRANSFERS (account-facing)
    // ============================================================

    /// Move allocated units between accounts. Balance-conserving and
    /// atomic: a failed precondition leaves both sides untouched.
    pub fn transfer(
        &mut self,
        sender: &Principal,
        recipient: &Principal,
        resource_id: ResourceId,
        amount: Amount,
    ) -> EngineResult<()> {
        self.system.assert_initialized()?;
        self.system.assert_open()?;
        if !self.directory.is_authorized(sender) || !self.directory.is_authorized(recipient) {
            return Err(EngineError::Unauthorized);
        }
        if sender == recipient {
            return Err(EngineError::InvalidRecipient);
        }
        let resource = self.registry.require(resource_id)?;
        if resource.frozen {
            return Err(EngineError::ResourceFrozen(resource_id));
        }
        if amount == 0 {
            return Err(EngineError::InvalidQuantity(
                "amount must be positive".into(),
            ));
        }
        self.ledger.transfer(sender, recipient, resource_id, amount)?;
        info!(
            sender = %sender,
            recipient = %recipient,
            resource = resource_id,
            amount,
            "transfer settled"
        );
        Ok(())
    }

    // ============================================================
    // QUERY OPERATIONS (Read-Only)
    // ============================================================

    #[inline]
    pub fn get_balance(&self, account: &Principal, resource: ResourceId) -> Amount {
        self.ledger.balance_of(account, resource)
    }

    pub fn get_balances(&self, account: &Principal) -> FxHashMap<ResourceId, Amount> {
        self.ledger.balances_of(account)
    }

    #[inline]
    pub fn get_resource(&self, id: ResourceId) -> Option<&ResourceType> {
        self.registry.get(id)
    }

    #[inline]
    pub fn get_request(&self, id: RequestId) -> Option<&AllocationRequest> {
        self.book.get(id)
    }

    pub fn get_allocation_history(&self, account: &Principal) -> Vec<RequestId> {
        self.ledger.history_of(account)
    }

    pub fn get_price_history(&self, id: ResourceId) -> EngineResult<Vec<PricePoint>> {
        Ok(self.registry.price_history(id)?.iter().copied().collect())
    }

    pub fn get_system_status(&self) -> SystemStatus {
        self.system.status()
    }

    pub fn role_of(&self, account: &Principal) -> Role {
        self.directory.role_of(account)
    }

    pub fn priority_level(&self, account: &Principal) -> u8 {
        self.directory.priority_level(account)
    }
}
