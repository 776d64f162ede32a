//! `sitedash` entry point.
//!
//! Resolves configuration and the site store to operate on, then dispatches
//! to the command handlers in [`site_dashboard::cmd`].
//!
//! ```bash
//! # Create a site and add work
//! sitedash new-site "Tower A"
//! sitedash add "Pour level 3 slab" --project tower-a --due "in 5d"
//! sitedash report weekly --planned 40 --actual 35
//!
//! # Figures and the dashboard
//! sitedash stats
//! sitedash ui
//! ```
//!
//! Data is stored in `~/.sitedash/` with each site as a separate JSON file.

use std::path::{Path, PathBuf};

use clap::Parser;

use site_dashboard::cli::Cli;
use site_dashboard::cmd::*;
use site_dashboard::config::{default_data_dir, Config, CONFIG_FILE};
use site_dashboard::site::{most_recent_site, Site};
use site_dashboard::store::SiteStore;

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .format_timestamp(None)
        .init();
}

/// Pick the store file: `--db`, then the configured default site, then the
/// most recently modified site, else a fresh "Default" site.
fn resolve_db_path(cli_db: Option<PathBuf>, config: &Config, data_dir: &Path) -> PathBuf {
    if let Some(path) = cli_db {
        return path;
    }
    if let Some(name) = config.default_site.as_deref() {
        log::debug!("using configured default site '{name}'");
        return Site::new(name, data_dir).file_path;
    }
    match most_recent_site(data_dir) {
        Ok(Some(site)) => {
            log::debug!("using most recent site '{}'", site.display_name);
            site.file_path
        }
        Ok(None) => {
            let site = Site::new("Default", data_dir);
            if let Err(e) = site.create_if_not_exists() {
                eprintln!("Failed to create default site: {}", e);
                std::process::exit(1);
            }
            site.file_path
        }
        Err(e) => {
            eprintln!("Failed to discover sites in {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_data_dir().join(CONFIG_FILE));
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    init_logging(&config);

    let data_dir = config.data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    // Commands that don't need a site store
    match &cli.command {
        Commands::Sites => {
            cmd_sites(&data_dir);
            return;
        }
        Commands::NewSite { name } => {
            cmd_new_site(&data_dir, name);
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        _ => {}
    }

    let db_path = resolve_db_path(cli.db, &config, &data_dir);
    let fallback = config.weekly_fallback;

    if let Commands::Ui = cli.command {
        cmd_ui(&db_path, fallback);
        return;
    }

    match cli.command {
        Commands::Ui | Commands::Sites | Commands::NewSite { .. } | Commands::Completions { .. } => {
            unreachable!("handled above")
        }

        // Read-only views render whatever they can from an unreadable store.
        Commands::Stats { now, json } => {
            cmd_stats(&SiteStore::load_or_default(&db_path), now, json, fallback)
        }

        Commands::Weekly { json } => cmd_weekly(&SiteStore::load_or_default(&db_path), json, fallback),

        Commands::Monthly { month, year } => {
            cmd_monthly(&SiteStore::load_or_default(&db_path), month, year)
        }

        Commands::List { status, project, overdue, sort, limit } =>
            cmd_list(&SiteStore::load_or_default(&db_path), status, project, overdue, sort, limit),

        Commands::Reports { kind, limit } => {
            cmd_reports(&SiteStore::load_or_default(&db_path), kind, limit)
        }

        // Anything that saves must start from the store as it is on disk.
        Commands::Add { name, project, assignee, status, start, due } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_add(&mut store, &db_path, name, project, assignee, status, start, due)
        }

        Commands::Status { id, status } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_status(&mut store, &db_path, id, status)
        }

        Commands::Update { id, name, project, assignee, start, due, clear_due, clear_assignee } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_update(&mut store, &db_path, id, name, project, assignee, start, due,
                       clear_due, clear_assignee)
        }

        Commands::Delete { ids } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_delete(&mut store, &db_path, ids)
        }

        Commands::Report { action } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_report(&mut store, &db_path, action)
        }

        Commands::Import { input } => {
            let mut store = load_for_edit_or_exit(&db_path);
            cmd_import(&mut store, &db_path, input)
        }
    }
}
