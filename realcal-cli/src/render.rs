//! TUI rendering traits for realcal types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to realcal-core types using owo_colors.

use chrono::{Datelike, NaiveDate};
use owo_colors::OwoColorize;
use realcal_core::view::{CalendarView, DayCell, MonthGrid};
use realcal_core::{Event, EventStatus, Settings};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventStatus {
    fn render(&self) -> String {
        match self {
            EventStatus::Done => "✓".dimmed().to_string(),
            EventStatus::Overdue => "!".red().to_string(),
            EventStatus::Upcoming => "•".green().to_string(),
        }
    }
}

impl Render for Settings {
    fn render(&self) -> String {
        let folder = if self.event_folder.is_empty() {
            "(whole vault)".dimmed().to_string()
        } else {
            self.event_folder.clone()
        };
        let fields: Vec<String> = self
            .field_order
            .iter()
            .map(|f| {
                if self.frontmatter_fields.is_enabled(*f) {
                    f.key().to_string()
                } else {
                    f.key().dimmed().strikethrough().to_string()
                }
            })
            .collect();

        [
            format!("  Event folder:  {}", folder),
            format!("  Week starts:   {}", self.week_start_day),
            format!("  New events:    {}", fields.join(", ")),
        ]
        .join("\n")
    }
}

/// Colorize text according to the event status
fn colorize_status(status: EventStatus, text: &str) -> String {
    match status {
        EventStatus::Done => text.dimmed().to_string(),
        EventStatus::Overdue => text.red().to_string(),
        EventStatus::Upcoming => text.green().to_string(),
    }
}

/// Rendering that depends on what day it is.
pub trait CalendarRender {
    fn render(&self, today: NaiveDate) -> String;
}

impl CalendarRender for Event {
    fn render(&self, today: NaiveDate) -> String {
        let status = self.status(today);
        format!("{} {}", status.render(), colorize_status(status, &self.label()))
    }
}

impl CalendarRender for CalendarView {
    fn render(&self, today: NaiveDate) -> String {
        match self {
            CalendarView::Month(grid) => render_month(grid, today),
            CalendarView::Week(days) => render_week(days, today),
            CalendarView::Day(cell) => render_day(cell, today),
        }
    }
}

fn render_month(grid: &MonthGrid, today: NaiveDate) -> String {
    let mut lines = Vec::new();

    let header: Vec<String> = grid.weekday_labels.iter().map(|l| format!("{:>3}", l)).collect();
    lines.push(header.join(" ").bold().to_string());

    let mut row: Vec<String> = vec!["   ".to_string(); grid.leading_blanks];
    for cell in &grid.days {
        let number = format!("{:>3}", cell.date.day());
        let number = if cell.is_today {
            number.reversed().to_string()
        } else if !cell.events.is_empty() {
            number.bold().to_string()
        } else {
            number.dimmed().to_string()
        };
        row.push(number);

        if row.len() == 7 {
            lines.push(row.join(" "));
            row.clear();
        }
    }
    if !row.is_empty() {
        lines.push(row.join(" "));
    }

    let busy: Vec<&DayCell> = grid.days.iter().filter(|c| !c.events.is_empty()).collect();
    if !busy.is_empty() {
        lines.push(String::new());
    }
    for cell in busy {
        lines.push(day_heading(cell));
        for event in &cell.events {
            lines.push(format!("   {}", event.render(today)));
        }
    }

    lines.join("\n")
}

fn render_week(days: &[DayCell], today: NaiveDate) -> String {
    let mut lines = Vec::new();

    for cell in days {
        lines.push(day_heading(cell));
        if cell.events.is_empty() {
            lines.push(format!("   {}", "No events".dimmed()));
        }
        for event in &cell.events {
            lines.push(format!("   {}", event.render(today)));
        }
    }

    lines.join("\n")
}

fn render_day(cell: &DayCell, today: NaiveDate) -> String {
    if cell.events.is_empty() {
        return "   No events for this day".dimmed().to_string();
    }

    let mut lines = Vec::new();
    for event in &cell.events {
        lines.push(format!("   {}", event.title.bold()));
        if let Some(time) = event.time_label() {
            lines.push(format!("      {}", time));
        }
        match event.status(today) {
            EventStatus::Done => lines.push(format!("      {}", "✓ Completed".dimmed())),
            EventStatus::Overdue => lines.push(format!("      {}", "⚠ Overdue".red())),
            EventStatus::Upcoming => {}
        }
        lines.push(format!("      {}", event.path().dimmed()));
    }

    lines.join("\n")
}

fn day_heading(cell: &DayCell) -> String {
    let heading = cell.date.format("%a, %b %-d").to_string();
    if cell.is_today {
        format!("{} {}", heading.bold(), "(today)".cyan())
    } else {
        heading.bold().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realcal_core::view::{CalendarCursor, EmbedOptions, ViewMode};
    use realcal_core::{FileRef, WeekStart};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(title: &str, date: &str, start: Option<&str>, done: bool) -> Event {
        Event {
            date: date.into(),
            title: title.into(),
            file: FileRef::new(format!("Events/{title}.md")),
            done,
            start_time: start.map(Into::into),
            end_time: None,
        }
    }

    fn view(mode: ViewMode, events: &[Event], today: NaiveDate) -> String {
        CalendarCursor::new(mode, today, WeekStart::Monday)
            .build(events, &EmbedOptions::default(), today)
            .render(today)
    }

    #[test]
    fn month_lists_busy_days_under_the_grid() {
        let today = d(2025, 10, 24);
        let events = vec![event("Dentist", "2025-10-24", Some("09:00"), false)];
        let out = view(ViewMode::Month, &events, today);

        assert!(out.contains("Mo"));
        assert!(out.contains("31"));
        assert!(out.contains("Fri, Oct 24"));
        assert!(out.contains("09:00 Dentist"));
    }

    #[test]
    fn week_marks_empty_days() {
        let today = d(2025, 10, 24);
        let events = vec![event("Review", "2025-10-20", None, true)];
        let out = view(ViewMode::Week, &events, today);

        assert!(out.contains("Mon, Oct 20"));
        assert!(out.contains("Sun, Oct 26"));
        assert!(out.contains("Review"));
        assert_eq!(out.matches("No events").count(), 6);
    }

    #[test]
    fn day_shows_times_and_status() {
        let today = d(2025, 10, 24);
        let mut late = event("Standup", "2025-10-24", Some("09:00"), false);
        late.end_time = Some("09:15".into());
        let out = view(ViewMode::Day, &[late], today);
        assert!(out.contains("Standup"));
        assert!(out.contains("09:00 - 09:15"));
        assert!(out.contains("Events/Standup.md"));

        let empty = view(ViewMode::Day, &[], today);
        assert!(empty.contains("No events for this day"));
    }

    #[test]
    fn overdue_and_done_are_labelled() {
        let today = d(2025, 10, 24);
        let cursor = CalendarCursor::new(ViewMode::Day, d(2025, 10, 1), WeekStart::Sunday);
        let events = vec![
            event("Missed", "2025-10-01", None, false),
            event("Finished", "2025-10-01", None, true),
        ];
        let out = cursor.build(&events, &EmbedOptions::default(), today).render(today);

        assert!(out.contains("Overdue"));
        assert!(out.contains("Completed"));
    }
}
