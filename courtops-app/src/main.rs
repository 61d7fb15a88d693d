//! CourtOps analyst agent.
//!
//! Runs a language model over the whitelisted court operations tools. Runs are
//! dry by default: every tool call is audited but nothing is changed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courtops_app::commands::{self, run::RunArgs};
use courtops_app::config::{Config, DEFAULT_CONFIG_PATH};
use courtops_app::{bootstrap, logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "courtops", version, about = "Municipal court operations agent")]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent on a goal or preset and print the run result as JSON.
    Run {
        /// Free-form goal.
        #[arg(short, long)]
        goal: Option<String>,
        /// Named preset (daily_ops_demo, change_request_docs, compliance_sweep).
        #[arg(short, long)]
        preset: Option<String>,
        /// Execute tools for real instead of a dry run.
        #[arg(long)]
        execute: bool,
        /// Tool that must be called before the run may finish. Repeatable.
        #[arg(long = "require", value_name = "TOOL")]
        require: Vec<String>,
        /// User id recorded in the audit log.
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// List whitelisted tools and presets.
    Tools,
    /// Seed the record store with deterministic demo data.
    Seed {
        /// Clear existing records first.
        #[arg(short, long)]
        force: bool,
    },
    /// Audit log maintenance.
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Show provider, model and record counts.
    Status,
}

#[derive(Subcommand)]
enum AuditCommand {
    /// Verify the audit log hash chain.
    Verify,
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("Invalid configuration")?;

    match cli.command {
        Command::Run {
            goal,
            preset,
            execute,
            require,
            user_id,
        } => {
            let args = RunArgs {
                goal,
                preset,
                execute,
                require,
                user_id,
            };
            // Reject bad arguments before touching the store.
            commands::run::build_request(&args)?;
            let app = bootstrap::build(config)?;
            commands::run::run(&app, &args).await
        }
        Command::Tools => {
            let app = bootstrap::build(config)?;
            commands::tools::run(&app);
            Ok(())
        }
        Command::Seed { force } => commands::seed::run(&config, force),
        Command::Audit {
            command: AuditCommand::Verify,
        } => commands::audit::verify(&config),
        Command::Status => {
            commands::status::run(&config);
            Ok(())
        }
    }
}
