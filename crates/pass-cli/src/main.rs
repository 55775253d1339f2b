//! PASS CLI - Main entry point

use anyhow::Context;
use clap::Parser;
use pass_cli::commands::select::SelectOptions;
use pass_cli::{Cli, Commands};
use pass_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads PASS_CORE_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Stderr)
        .log_file_prefix("pass-cli")
        .build();

    // Environment variables take precedence over the flags
    let log_config = match log_config.clone().merge_env() {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            log_config
        }
    };

    // The CLI works without logging, so a failed init is not fatal
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    let client = cli
        .client()
        .with_context(|| format!("cannot connect to PASS at '{}'", cli.url))?;
    let mut stdout = std::io::stdout();

    match &cli.command {
        Commands::Get { entity_type, id, include } => {
            pass_cli::commands::get::run(&client, entity_type, id, include, &mut stdout).await?
        }

        Commands::Select {
            entity_type,
            filter,
            sort,
            include,
            offset,
            limit,
            all,
        } => {
            let options = SelectOptions {
                filter: filter.clone(),
                sort: sort.clone(),
                include: include.clone(),
                offset: *offset,
                limit: *limit,
                all: *all,
            };
            pass_cli::commands::select::run(&client, entity_type, &options, &mut stdout).await?
        }

        Commands::Delete { entity_type, id } => {
            pass_cli::commands::delete::run(&client, entity_type, id, &mut stdout).await?
        }
    }

    Ok(())
}
