use crate::bootstrap;
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::Utc;
use courtops_infra::infra::seed::seed_demo_data;

pub fn run(config: &Config, force: bool) -> Result<()> {
    let store = bootstrap::open_store(config)?;
    let outcome = seed_demo_data(&store, Utc::now(), force).context("Failed to seed demo data")?;

    if outcome.seeded {
        println!("Seeded demo data into {}", config.database_path().display());
    } else {
        println!("Store already populated; use --force to reseed");
    }
    let c = outcome.counts;
    println!(
        "tickets={} devices={} patches={} change_requests={} cases={}",
        c.tickets, c.devices, c.patches, c.change_requests, c.cases
    );
    Ok(())
}
