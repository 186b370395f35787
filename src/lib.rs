//! quotacore - Priority-Aware Resource Allocation Engine
//!
//! Registers finite resource pools, admits allocation requests from
//! identified accounts and keeps auditable pricing/allocation history.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (Principal, ResourceId, etc.)
//! - [`error`] - Engine error taxonomy with stable codes
//! - [`directory`] - Account roles, restriction flags, priority levels
//! - [`registry`] - Resource pools, supply and price history
//! - [`ledger`] - Per-account balances and allocation history
//! - [`request`] - Allocation request records and status machine
//! - [`system`] - Global switches and parameters
//! - [`engine`] - QuotaEngine, the single-threaded core service
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing setup

// Core types - must be first!
pub mod core_types;

// Engine components
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod request;
pub mod system;

// Convenient re-exports at crate root
pub use config::{AppConfig, EngineConfig};
pub use core_types::{Amount, Principal, PrincipalError, RequestId, ResourceId, Timestamp};
pub use directory::{AccountDirectory, Role};
pub use engine::{ClockFn, QuotaEngine};
pub use error::{EngineError, EngineResult};
pub use ledger::{AllocationLedger, ALLOCATION_HISTORY_CAP};
pub use registry::{PricePoint, ResourceRegistry, ResourceType, PRICE_HISTORY_CAP};
pub use request::{AllocationRequest, RequestBook, RequestStatus};
pub use system::{SystemState, SystemStatus};
