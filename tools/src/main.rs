//! riskwatch: headless runner for the supply-chain risk engine.
//!
//! Usage:
//!   riskwatch --db risk.db --demo-seed 42
//!   riskwatch --db risk.db --agent supplierRiskAgent
//!   riskwatch --db risk.db --config engine.json
//!
//! With `--agent` the runner executes that agent once and prints the outcome
//! as JSON. Otherwise it runs the scheduler until Ctrl-C.

use anyhow::{bail, Result};
use riskwatch_core::{
    agent::AgentName,
    config::EngineConfig,
    demo::{seed_demo, DemoSize},
    engine::RiskEngine,
    scheduler::{AgentScheduler, RunOutcome},
    store::RiskStore,
    types::RiskTier,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let config = match arg_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let store = if db == ":memory:" {
        RiskStore::in_memory()?
    } else {
        RiskStore::open(db)?
    };
    store.migrate()?;
    let engine = RiskEngine::new(Arc::new(store), config);

    println!("riskwatch");
    println!("  db:      {db}");

    if let Some(seed) = arg_value(&args, "--demo-seed") {
        let seed: u64 = seed.parse()?;
        let summary = seed_demo(&engine.store, seed, DemoSize::default(), engine.now())?;
        println!("  demo:    {}", serde_json::to_string(&summary)?);
    }
    println!();

    let scheduler = AgentScheduler::new(engine.clone());

    if let Some(name) = arg_value(&args, "--agent") {
        let Some(agent) = AgentName::parse(name) else {
            bail!("unknown agent '{name}'");
        };
        match scheduler.run_agent(agent).await {
            RunOutcome::Completed(summary) => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                print_tiers(&engine)?;
            }
            RunOutcome::Skipped => println!("{agent} is already running"),
            RunOutcome::Failed(e) => bail!("{agent} failed: {e}"),
        }
        return Ok(());
    }

    let handle = scheduler.start();
    println!("scheduler running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    log::info!("shutdown requested");
    handle.shutdown().await?;

    let purged = engine.purge_expired_alerts()?;
    log::info!("purged {purged} expired alerts");
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn print_tiers(engine: &RiskEngine) -> Result<()> {
    for org in engine.store.list_active_organizations()? {
        let tiers = engine.store.risk_tier_distribution(&org, None)?;
        let line: Vec<String> = [RiskTier::Low, RiskTier::Medium, RiskTier::High, RiskTier::Critical]
            .iter()
            .map(|t| format!("{t}={}", tiers.get(t).copied().unwrap_or(0)))
            .collect();
        println!("  {org}: {}", line.join(" "));
    }
    Ok(())
}
