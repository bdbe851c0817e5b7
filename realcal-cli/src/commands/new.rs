use anyhow::{Context, Result};
use dialoguer::Input;
use owo_colors::OwoColorize;
use realcal_core::date_utils::{format_date, today};
use realcal_core::{FileChange, NewEvent, RealCalError, RealCalendar};

pub async fn run(
    calendar: &RealCalendar,
    name: Option<String>,
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let interactive = name.is_none();

    // --- Name ---
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("  Event name")
            .interact_text()?,
    };

    // --- Date ---
    let date = match date {
        Some(d) => d,
        None if interactive => Input::new()
            .with_prompt("  Date")
            .default(format_date(today()))
            .interact_text()?,
        None => format_date(today()),
    };

    // --- Times ---
    let start = match start {
        Some(s) => Some(s),
        None if interactive => optional_prompt("  Start time (HH:MM, skip)")?,
        None => None,
    };
    let end = match end {
        Some(e) => Some(e),
        None if interactive => optional_prompt("  End time (HH:MM, skip)")?,
        None => None,
    };

    let event = NewEvent {
        name,
        date,
        start_time: start,
        end_time: end,
    };

    calendar.ensure_current().await?;

    let created = match calendar.create_event(&event).await {
        Ok(created) => created,
        Err(RealCalError::InvalidInput(msg)) => {
            anyhow::bail!("{}", msg);
        }
        Err(e) => {
            return Err(e).context("Error creating event. The file might already exist.");
        }
    };

    // No watcher runs here, so report the new note ourselves.
    calendar
        .handle_change(FileChange::Created(created.file.clone()))
        .await;

    if interactive {
        println!();
    }
    if created.renamed {
        println!(
            "{}",
            format!(
                "  Event created as \"{}\" (original name already existed)",
                created.file.basename()
            )
            .yellow()
        );
    } else {
        println!(
            "{}",
            format!("  Event \"{}\" created!", created.file.basename()).green()
        );
    }
    println!("  {}", created.file.path.dimmed());

    Ok(())
}

fn optional_prompt(prompt: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .default(String::new())
        .show_default(false)
        .interact_text()?;

    Ok(if input.trim().is_empty() { None } else { Some(input) })
}
