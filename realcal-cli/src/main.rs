mod commands;
mod config;
mod render;
mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use realcal_core::date_utils::{parse_date, today};
use realcal_core::{FsVault, JsonDataStore, RealCalendar, ViewMode, WeekStart, YamlCodec};
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;

#[derive(Parser)]
#[command(name = "realcal")]
#[command(about = "A calendar for events kept as markdown notes")]
struct Cli {
    /// Vault directory (defaults to vault_dir from the config file)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a month, week or day view
    Show {
        #[arg(long, default_value_t = ViewMode::Month)]
        view: ViewMode,

        /// Date to show (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Only show events from this folder
        #[arg(long)]
        folder: Option<String>,

        /// Leave out events marked as done
        #[arg(long)]
        hide_completed: bool,
    },
    /// Create a new event note
    New {
        name: Option<String>,

        /// Event date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Start time (HH:MM)
        #[arg(short, long)]
        start: Option<String>,

        /// End time (HH:MM)
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Rebuild the event cache from the vault
    Rescan,
    /// Move an event note to the vault trash
    Trash {
        /// Path of the note, relative to the vault
        path: String,

        /// Delete the note instead of moving it to .trash
        #[arg(long)]
        permanent: bool,
    },
    /// Show or change calendar settings
    Config {
        /// Folder events are read from and created in ("" for the whole vault)
        #[arg(long)]
        event_folder: Option<String>,

        /// First day of the week (sunday or monday)
        #[arg(long)]
        week_start: Option<WeekStart>,
    },
    /// Keep a view on screen and redraw it as notes change
    Watch {
        #[arg(long, default_value_t = ViewMode::Month)]
        view: ViewMode,

        /// Only show events from this folder
        #[arg(long)]
        folder: Option<String>,

        /// Leave out events marked as done
        #[arg(long)]
        hide_completed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let vault = resolve_vault(cli.vault)?;

    match cli.command {
        Commands::Show {
            view,
            date,
            folder,
            hide_completed,
        } => {
            let date = resolve_date(date.as_deref())?;
            let calendar = open_calendar(&vault).await;
            commands::show::run(&calendar, view, date, folder, hide_completed).await
        }
        Commands::New {
            name,
            date,
            start,
            end,
        } => {
            let calendar = open_calendar(&vault).await;
            commands::new::run(&calendar, name, date, start, end).await
        }
        Commands::Rescan => {
            let calendar = open_calendar(&vault).await;
            commands::rescan::run(&calendar).await
        }
        Commands::Trash { path, permanent } => {
            let calendar = open_calendar(&vault).await;
            commands::trash::run(&calendar, &path, permanent).await
        }
        Commands::Config {
            event_folder,
            week_start,
        } => {
            let calendar = open_calendar(&vault).await;
            commands::config::run(&calendar, &vault, event_folder, week_start).await
        }
        Commands::Watch {
            view,
            folder,
            hide_completed,
        } => {
            let calendar = open_calendar(&vault).await;
            commands::watch::run(calendar, &vault, view, folder, hide_completed).await
        }
    }
}

fn resolve_vault(flag: Option<PathBuf>) -> Result<PathBuf> {
    let vault = match flag {
        Some(path) => path,
        None => GlobalConfig::load()?.vault_path(),
    };

    if !vault.is_dir() {
        anyhow::bail!(
            "No vault found at {}.\n\n\
            Point realcal at your notes with:\n  \
            realcal --vault <DIR> ...\n\n\
            or set vault_dir in {}",
            vault.display(),
            GlobalConfig::config_path()?.display()
        );
    }

    Ok(vault)
}

fn resolve_date(date: Option<&str>) -> Result<chrono::NaiveDate> {
    match date {
        Some(s) => parse_date(s.trim())
            .ok_or_else(|| anyhow::anyhow!("Invalid date '{}'. Use YYYY-MM-DD", s)),
        None => Ok(today()),
    }
}

async fn open_calendar(vault: &Path) -> RealCalendar {
    let store = Arc::new(FsVault::new(vault));
    let data = Arc::new(JsonDataStore::for_vault(vault));

    RealCalendar::open(store, Arc::new(YamlCodec), data).await
}
