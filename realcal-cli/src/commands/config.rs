use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use realcal_core::{JsonDataStore, RealCalendar, WeekStart};

use crate::config::GlobalConfig;
use crate::render::Render;

pub async fn run(
    calendar: &RealCalendar,
    vault: &Path,
    event_folder: Option<String>,
    week_start: Option<WeekStart>,
) -> Result<()> {
    calendar.ensure_current().await?;

    if event_folder.is_some() || week_start.is_some() {
        let mut settings = calendar.settings();
        if let Some(folder) = event_folder {
            settings.set_event_folder(&folder);
        }
        if let Some(week_start) = week_start {
            settings.week_start_day = week_start;
        }
        calendar.update_settings(settings).await?;
        println!("{}", "Settings saved".green());
        println!();
    }

    println!("{}", "Paths".bold());
    println!("  Config:  {}", GlobalConfig::config_path()?.display());
    println!("  Vault:   {}", vault.display());
    println!("  Data:    {}", JsonDataStore::for_vault(vault).path().display());
    println!();
    println!("{}", "Settings".bold());
    println!("{}", calendar.settings().render());

    Ok(())
}
