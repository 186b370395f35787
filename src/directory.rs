//! Account Directory - roles, restriction flags, priority derivation
//!
//! Maps principal identities to a role and a restriction flag. Accounts
//! are created implicitly on first reference and never deleted; an
//! account with no entry is an ordinary unrestricted USER.
//!
//! Administrative gating (who may call set_role/restrict) lives in the
//! engine facade; this module owns only the maps.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core_types::Principal;

/// Account role. Total order by priority, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Premium,
    Business,
    Verified,
    #[default]
    User,
}

impl Role {
    /// Fixed role → priority mapping. No partial credit between tiers.
    #[inline]
    pub const fn priority(self) -> u8 {
        match self {
            Role::Admin => 5,
            Role::Premium => 4,
            Role::Business => 3,
            Role::Verified => 2,
            Role::User => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Premium => "PREMIUM",
            Role::Business => "BUSINESS",
            Role::Verified => "VERIFIED",
            Role::User => "USER",
        }
    }
}

/// Role and restriction state for all known accounts.
///
/// Side effects are confined to these two maps; nothing here touches
/// registry or ledger state.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AccountDirectory {
    roles: FxHashMap<Principal, Role>,
    restricted: FxHashSet<Principal>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Role of an account; defaults to USER when unset.
    #[inline]
    pub fn role_of(&self, account: &Principal) -> Role {
        self.roles.get(account).copied().unwrap_or_default()
    }

    /// Priority level in 1..=5 derived from the role.
    #[inline]
    pub fn priority_level(&self, account: &Principal) -> u8 {
        self.role_of(account).priority()
    }

    /// True unless the account is restricted. Restriction is the sole
    /// authorization veto here; role gating happens downstream per
    /// resource.
    #[inline]
    pub fn is_authorized(&self, account: &Principal) -> bool {
        !self.restricted.contains(account)
    }

    #[inline]
    pub fn is_restricted(&self, account: &Principal) -> bool {
        self.restricted.contains(account)
    }

    /// Assign a role, creating the account entry on first reference.
    pub fn set_role(&mut self, account: Principal, role: Role) {
        self.roles.insert(account, role);
    }

    pub fn restrict(&mut self, account: Principal) {
        self.restricted.insert(account);
    }

    pub fn unrestrict(&mut self, account: &Principal) {
        self.restricted.remove(account);
    }
}
