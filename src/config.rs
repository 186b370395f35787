use serde::{Deserialize, Serialize};
use std::fs;

use crate::core_types::Amount;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub rotation: String,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Engine parameters fixed at construction.
///
/// The administrator identity lives here rather than being derived from
/// whoever constructed the engine; rotation happens through a guarded
/// engine operation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    pub admin: String,
    pub emergency_contact: String,
    /// Upper bound for any registered supply or price figure.
    pub quantity_ceiling: Amount,
    /// Default per-request allocation ceiling; adjustable at runtime via
    /// `update_parameters`.
    pub global_allocation_ceiling: Amount,
    /// Request lifetime. The reference window was 144 blocks (~1 day);
    /// here it is a plain duration.
    pub expiry_window_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin: "admin".to_string(),
            emergency_contact: "admin".to_string(),
            quantity_ceiling: 1_000_000_000,
            global_allocation_ceiling: 1_000_000,
            expiry_window_secs: 86_400,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
