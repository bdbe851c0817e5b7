use anyhow::Result;
use owo_colors::OwoColorize;
use realcal_core::{FileChange, RealCalendar};

pub async fn run(calendar: &RealCalendar, path: &str, permanent: bool) -> Result<()> {
    calendar.ensure_current().await?;

    let file = calendar.trash_event(path, permanent).await.map_err(|e| {
        eprintln!("{}", "Failed to move file to trash.".red());
        e
    })?;

    // No watcher runs here, so report the deletion ourselves.
    calendar.handle_change(FileChange::Deleted(file.clone())).await;

    if permanent {
        println!("Deleted \"{}\"", file.basename());
    } else {
        println!("Moved \"{}\" to trash", file.basename());
    }

    Ok(())
}
