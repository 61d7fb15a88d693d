use crate::config::Config;
use courtops_infra::SqliteRecordStore;

/// Print provider and loop settings, plus record counts when a database exists.
pub fn run(config: &Config) {
    println!("status:        ok");
    println!("llm_provider:  {}", config.llm.provider);
    println!("model:         {}", config.llm.model);
    println!("base_url:      {}", config.llm.base_url);
    println!("max_turns:     {}", config.agent.max_turns);
    if let Some(quota) = config.agent.max_calls_per_tool {
        println!("tool quota:    {}", quota);
    }

    let db = config.database_path();
    if !db.exists() {
        println!("database:      {} (not created; run `courtops seed`)", db.display());
        return;
    }
    match SqliteRecordStore::open(&db).and_then(|s| s.counts()) {
        Ok(c) => println!(
            "database:      {} (tickets={} devices={} patches={} change_requests={} cases={})",
            db.display(),
            c.tickets,
            c.devices,
            c.patches,
            c.change_requests,
            c.cases
        ),
        Err(e) => println!("database:      {} (unreadable: {})", db.display(), e),
    }
}
