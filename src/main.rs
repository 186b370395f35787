//! quotacore - demo entry point
//!
//! Boots an engine from the selected config, walks one admission cycle
//! (register pool → submit → approve → transfer) and dumps the final
//! system status as JSON. The real API surface is the library; this
//! binary exists to exercise it end to end with logging enabled.

use anyhow::{Context, Result};
use tracing::info;

use quotacore::{AppConfig, Principal, QuotaEngine, Role};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--env" && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn main() -> Result<()> {
    let config = AppConfig::load(&get_env());
    let _guard = quotacore::logging::init_logging(&config);

    let admin = Principal::new(config.engine.admin.clone()).context("admin identity")?;
    let mut engine = QuotaEngine::new(&config.engine).context("engine construction")?;

    engine.initialize(&admin)?;
    engine.register_resource(&admin, 1, "compute", 1000, 10, 5, 100, 1)?;
    engine.register_resource(&admin, 2, "gpu", 200, 250, 1, 20, 3)?;

    let alice = Principal::new("alice")?;
    let bob = Principal::new("bob")?;
    engine.set_role(&admin, alice.clone(), Role::Business)?;

    let req = engine.submit_allocation_request(&alice, 1, 50, "nightly batch import")?;
    engine.approve(&admin, req)?;
    engine.transfer(&alice, &bob, 1, 20)?;

    let gpu_req = engine.submit_allocation_request(&alice, 2, 10, "model training")?;
    info!(
        request = gpu_req,
        balance_alice = engine.get_balance(&alice, 1),
        balance_bob = engine.get_balance(&bob, 1),
        "demo cycle complete"
    );

    let status = serde_json::to_string_pretty(&engine.get_system_status())?;
    println!("{status}");
    Ok(())
}
