use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bc_db::{Tracker, open_store};
use chrono::{Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bc_cli::commands::util::parse_timestamp;
use bc_cli::commands::{edit, erase, list, pool, record, stats, status};
use bc_cli::{Cli, Commands, Config};

/// Load config and open the tracker, ensuring the database directory exists.
fn open_tracker(config_path: Option<&Path>) -> Result<(Tracker, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let namespace = config.namespace().context("invalid tenant")?;
    let store = open_store(
        &config.database_path,
        config.store_config(),
        config.connection_ttl(),
    );
    let tracker = Tracker::new(store, namespace, config.tracker_config());
    Ok((tracker, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (tracker, config) = open_tracker(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    let out = &mut stdout;

    match command {
        Commands::Update { action, at } => {
            let at = at.as_deref().map_or_else(
                || Ok(Utc::now().timestamp_millis()),
                parse_timestamp,
            )?;
            record::update(out, &tracker, *action, at)?;
        }
        Commands::Save { action, at } => {
            record::save(out, &tracker, *action, parse_timestamp(at)?)?;
        }
        Commands::Search { start, end, json } => {
            list::search(
                out,
                &tracker,
                parse_timestamp(start)?,
                parse_timestamp(end)?,
                *json,
            )?;
        }
        Commands::Delete { at } => edit::delete(out, &tracker, parse_timestamp(at)?)?,
        Commands::Move { at, to } => {
            edit::move_event(out, &tracker, parse_timestamp(at)?, parse_timestamp(to)?)?;
        }
        Commands::Rename { at, name } => {
            edit::rename(out, &tracker, parse_timestamp(at)?, *name)?;
        }
        Commands::Dump { json } => list::dump(out, &tracker, *json)?,
        Commands::Erase { yes } => erase::erase(out, &tracker, *yes)?,
        Commands::Stats {
            period,
            start,
            end,
            json,
        } => match (start, end) {
            (Some(start), Some(end)) => stats::run_range(
                out,
                &tracker,
                parse_timestamp(start)?,
                parse_timestamp(end)?,
                *json,
            )?,
            _ => stats::run_period(
                out,
                &tracker,
                period.unwrap_or_default(),
                &Local::now(),
                *json,
            )?,
        },
        Commands::Status { json } => status::run(
            out,
            &tracker,
            &config.database_path,
            Utc::now().timestamp_millis(),
            *json,
        )?,
        Commands::Reset => erase::reset(out, &tracker)?,
        Commands::PoolStats { json } => pool::run(out, &tracker, *json)?,
    }

    out.flush()?;
    Ok(())
}
