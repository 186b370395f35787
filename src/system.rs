//! System Controller state - global switches and parameters
//!
//! The process-lifetime singleton behind every global gate: the one-way
//! initialization latch, the frozen/maintenance switches, the global
//! allocation ceiling and the emergency contact. Held by value inside
//! the engine rather than as ambient module state, so construction and
//! initialization are explicit steps.

use serde::{Deserialize, Serialize};

use crate::core_types::{Amount, Principal};
use crate::error::{EngineError, EngineResult};

/// Global engine switches and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// One-way latch; flips true exactly once.
    initialized: bool,
    /// Blocks all mutating allocation/transfer operations.
    frozen: bool,
    /// Maintenance mode. Entering also sets `frozen`.
    maintenance: bool,
    global_allocation_ceiling: Amount,
    emergency_contact: Principal,
}

/// Read-only status snapshot, serializable for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub initialized: bool,
    pub frozen: bool,
    pub maintenance: bool,
    pub global_allocation_ceiling: Amount,
    pub emergency_contact: Principal,
}

impl SystemState {
    pub fn new(global_allocation_ceiling: Amount, emergency_contact: Principal) -> Self {
        Self {
            initialized: false,
            frozen: false,
            maintenance: false,
            global_allocation_ceiling,
            emergency_contact,
        }
    }

    // ============================================================
    // GATES
    // ============================================================

    /// Every mutating operation passes this first.
    #[inline]
    pub fn assert_initialized(&self) -> EngineResult<()> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    /// Gate for allocation/transfer mutations. Maintenance implies
    /// frozen, so a single flag check per field suffices.
    #[inline]
    pub fn assert_open(&self) -> EngineResult<()> {
        if self.frozen || self.maintenance {
            return Err(EngineError::SystemFrozen);
        }
        Ok(())
    }

    // ============================================================
    // TRANSITIONS
    // ============================================================

    /// Flip the latch. Clears both switches so the engine starts open.
    pub fn initialize(&mut self) -> EngineResult<()> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized);
        }
        self.initialized = true;
        self.frozen = false;
        self.maintenance = false;
        Ok(())
    }

    pub fn update_parameters(
        &mut self,
        new_ceiling: Amount,
        emergency_contact: Principal,
    ) -> EngineResult<()> {
        if new_ceiling == 0 {
            return Err(EngineError::InvalidParameter(
                "global allocation ceiling must be positive".into(),
            ));
        }
        self.global_allocation_ceiling = new_ceiling;
        self.emergency_contact = emergency_contact;
        Ok(())
    }

    pub fn enter_maintenance(&mut self) {
        self.maintenance = true;
        self.frozen = true;
    }

    pub fn exit_maintenance(&mut self) {
        self.maintenance = false;
        self.frozen = false;
    }

    // ============================================================
    // READS
    // ============================================================

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn global_allocation_ceiling(&self) -> Amount {
        self.global_allocation_ceiling
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            initialized: self.initialized,
            frozen: self.frozen,
            maintenance: self.maintenance,
            global_allocation_ceiling: self.global_allocation_ceiling,
            emergency_contact: self.emergency_contact.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SystemState {
        SystemState::new(10_000, Principal::new("ops-oncall").unwrap())
    }

    #[test]
    fn test_initialize_latch_is_one_way() {
        let mut sys = state();
        assert_eq!(sys.assert_initialized(), Err(EngineError::NotInitialized));

        sys.initialize().unwrap();
        assert!(sys.assert_initialized().is_ok());
        assert_eq!(sys.initialize(), Err(EngineError::AlreadyInitialized));
    }

    #[test]
    fn test_maintenance_implies_frozen() {
        let mut sys = state();
        sys.initialize().unwrap();
        assert!(sys.assert_open().is_ok());

        sys.enter_maintenance();
        let status = sys.status();
        assert!(status.maintenance);
        assert!(status.frozen);
        assert_eq!(sys.assert_open(), Err(EngineError::SystemFrozen));

        sys.exit_maintenance();
        let status = sys.status();
        assert!(!status.maintenance);
        assert!(!status.frozen);
        assert!(sys.assert_open().is_ok());
    }

    #[test]
    fn test_update_parameters_rejects_zero_ceiling() {
        let mut sys = state();
        let err = sys
            .update_parameters(0, Principal::new("ops-backup").unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter(_)));
        assert_eq!(sys.global_allocation_ceiling(), 10_000);

        sys.update_parameters(20_000, Principal::new("ops-backup").unwrap())
            .unwrap();
        assert_eq!(sys.global_allocation_ceiling(), 20_000);
        assert_eq!(sys.status().emergency_contact.as_str(), "ops-backup");
    }
}
