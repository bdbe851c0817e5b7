use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use owo_colors::OwoColorize;
use realcal_core::date_utils::today;
use realcal_core::view::{CalendarCursor, EmbedOptions};
use realcal_core::{FileChange, FsVault, RealCalendar, ViewMode};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::render::CalendarRender;
use crate::utils::tui;

pub async fn run(
    calendar: RealCalendar,
    vault: &Path,
    view: ViewMode,
    folder: Option<String>,
    hide_completed: bool,
) -> Result<()> {
    let calendar = Arc::new(calendar);
    let options = super::view_options(view, folder, hide_completed);
    let mut cursor = CalendarCursor::new(view, today(), calendar.settings().week_start_day);

    let (tx, rx) = mpsc::unbounded_channel();
    let store = FsVault::new(vault);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                for change in to_changes(&store, event) {
                    if tx.send(change).is_err() {
                        debug!("change receiver closed");
                    }
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        }
    })
    .context("Could not start file watcher")?;
    watcher
        .watch(vault, RecursiveMode::Recursive)
        .with_context(|| format!("Could not watch {}", vault.display()))?;

    let mut refresh = calendar.subscribe();
    draw(&calendar, &cursor, &options, vault);

    calendar.start();
    calendar
        .ensure_initialized()
        .await
        .context("Could not load calendar events")?;

    let notifications = {
        let calendar = calendar.clone();
        tokio::spawn(async move { calendar.run_notifications(rx).await })
    };

    draw(&calendar, &cursor, &options, vault);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = refresh.changed() => {
                if changed.is_err() {
                    break;
                }
                refresh.borrow_and_update();
                cursor.week_start = calendar.settings().week_start_day;
                draw(&calendar, &cursor, &options, vault);
            }
        }
    }

    notifications.abort();
    calendar.teardown();
    Ok(())
}

fn draw(calendar: &RealCalendar, cursor: &CalendarCursor, options: &EmbedOptions, vault: &Path) {
    tui::clear_screen();
    println!("{}", cursor.title().bold());
    println!();

    if !calendar.is_ready() {
        println!("{}", "Loading calendar events...".dimmed());
        return;
    }

    let today = today();
    let layout = cursor.build(&calendar.cache().events(), options, today);
    println!("{}", layout.render(today));
    println!();
    println!(
        "{}",
        format!("Watching {} (Ctrl-C to quit)", vault.display()).dimmed()
    );
}

/// Translate a filesystem event into vault change notifications.
fn to_changes(vault: &FsVault, event: notify::Event) -> Vec<FileChange> {
    let refs = |paths: &[PathBuf]| -> Vec<_> {
        paths.iter().filter_map(|p| vault.file_ref_for(p)).collect()
    };

    match event.kind {
        EventKind::Create(_) => refs(&event.paths).into_iter().map(FileChange::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            let from = vault.file_ref_for(&event.paths[0]);
            let to = vault.file_ref_for(&event.paths[1]);
            match (from, to) {
                (Some(from), Some(to)) => vec![FileChange::Renamed {
                    file: to,
                    old_path: from.path,
                }],
                // moved in from outside the vault, e.g. back out of .trash
                (None, Some(to)) => vec![FileChange::Created(to)],
                (Some(from), None) => vec![FileChange::Deleted(from)],
                (None, None) => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => refs(&event.paths)
            .into_iter()
            .map(|file| FileChange::Renamed {
                old_path: file.path.clone(),
                file,
            })
            .collect(),
        EventKind::Modify(_) => refs(&event.paths).into_iter().map(FileChange::Modified).collect(),
        EventKind::Remove(_) => refs(&event.paths).into_iter().map(FileChange::Deleted).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use realcal_core::FileRef;

    fn vault() -> FsVault {
        FsVault::new("/vault")
    }

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn create_modify_remove() {
        let changes = to_changes(
            &vault(),
            event(EventKind::Create(CreateKind::File), &["/vault/Events/a.md"]),
        );
        assert_eq!(changes, vec![FileChange::Created(FileRef::new("Events/a.md"))]);

        let changes = to_changes(
            &vault(),
            event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/vault/a.md"],
            ),
        );
        assert_eq!(changes, vec![FileChange::Modified(FileRef::new("a.md"))]);

        let changes = to_changes(
            &vault(),
            event(EventKind::Remove(RemoveKind::File), &["/vault/a.md"]),
        );
        assert_eq!(changes, vec![FileChange::Deleted(FileRef::new("a.md"))]);
    }

    #[test]
    fn rename_within_vault() {
        let changes = to_changes(
            &vault(),
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/vault/old.md", "/vault/new.md"],
            ),
        );
        assert_eq!(
            changes,
            vec![FileChange::Renamed {
                file: FileRef::new("new.md"),
                old_path: "old.md".into(),
            }]
        );
    }

    #[test]
    fn moving_into_trash_is_a_delete() {
        let changes = to_changes(
            &vault(),
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/vault/a.md", "/vault/.trash/a.md"],
            ),
        );
        assert_eq!(changes, vec![FileChange::Deleted(FileRef::new("a.md"))]);
    }

    #[test]
    fn hidden_paths_are_ignored() {
        let changes = to_changes(
            &vault(),
            event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/vault/.realcal/data.json"],
            ),
        );
        assert!(changes.is_empty());
    }
}
