use anyhow::Result;
use owo_colors::OwoColorize;
use realcal_core::RealCalendar;

use crate::utils::tui;

pub async fn run(calendar: &RealCalendar) -> Result<()> {
    let spinner = tui::create_spinner("Scanning vault...");
    let result = calendar.rescan_now().await;
    spinner.finish_and_clear();

    let count = result?;
    let noun = if count == 1 { "event" } else { "events" };
    println!("{}", format!("Found {} {}", count, noun).green());

    Ok(())
}
