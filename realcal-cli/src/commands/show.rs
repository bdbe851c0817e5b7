use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use realcal_core::date_utils::today;
use realcal_core::view::CalendarCursor;
use realcal_core::{RealCalendar, ViewMode};

use crate::render::CalendarRender;

pub async fn run(
    calendar: &RealCalendar,
    view: ViewMode,
    date: NaiveDate,
    folder: Option<String>,
    hide_completed: bool,
) -> Result<()> {
    let options = super::view_options(view, folder, hide_completed);
    let cursor = CalendarCursor::new(view, date, calendar.settings().week_start_day);
    let today = today();

    calendar.ensure_current().await?;
    let layout = calendar.view(&cursor, &options, today).await?;

    println!("{}", cursor.title().bold());
    println!();
    println!("{}", layout.render(today));

    Ok(())
}
