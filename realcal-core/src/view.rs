//! What calendar views show: which events fall on which day, grid layout,
//! navigation and titles. Rendering itself is up to the host.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date_utils::format_date;
use crate::event::Event;
use crate::metadata::{Metadata, MetadataCodec};
use crate::settings::WeekStart;
use crate::store::{is_under, normalize_path};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    Day,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(ViewMode::Month),
            "week" => Ok(ViewMode::Week),
            "day" => Ok(ViewMode::Day),
            _ => Err(format!("Unknown view '{}'. Expected month, week or day", s)),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViewMode::Month => write!(f, "month"),
            ViewMode::Week => write!(f, "week"),
            ViewMode::Day => write!(f, "day"),
        }
    }
}

/// Options of an embedded calendar block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    pub view: Option<ViewMode>,
    pub show_completed: Option<bool>,
    /// Only show events whose note lies in this folder.
    pub folder: Option<String>,
}

impl EmbedOptions {
    /// Read options from the body of an embed block. Anything unreadable or
    /// of the wrong type is ignored.
    pub fn parse(source: &str, codec: &dyn MetadataCodec) -> Self {
        let mut options = EmbedOptions::default();
        if source.trim().is_empty() {
            return options;
        }
        let Ok(meta) = codec.decode(source) else {
            return options;
        };

        if let Some(Metadata::String(view)) = meta.get("view") {
            options.view = view.parse().ok();
        }
        if let Some(Metadata::Bool(show)) = meta.get("showCompleted") {
            options.show_completed = Some(*show);
        }
        if let Some(folder) = meta.get("folder").and_then(Metadata::to_plain_string) {
            let folder = normalize_path(&folder);
            if !folder.is_empty() {
                options.folder = Some(folder);
            }
        }
        options
    }

    fn shows(&self, event: &Event) -> bool {
        if let Some(folder) = &self.folder {
            if !is_under(event.path(), folder) {
                return false;
            }
        }
        !(self.show_completed == Some(false) && event.done)
    }
}

/// Events on `date` that pass the filters, ordered by start time. Events
/// without a start time come first.
pub fn events_for_day(events: &[Event], date: NaiveDate, options: &EmbedOptions) -> Vec<Event> {
    let date = format_date(date);
    let mut day: Vec<Event> = events
        .iter()
        .filter(|e| e.date == date && options.shows(e))
        .cloned()
        .collect();
    day.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    day
}

/// First day of the week containing `date`.
pub fn week_start(date: NaiveDate, start: WeekStart) -> NaiveDate {
    let offset = days_after_week_start(date, start);
    date.checked_sub_days(Days::new(offset.into())).unwrap_or(date)
}

fn days_after_week_start(date: NaiveDate, start: WeekStart) -> u32 {
    (date.weekday().num_days_from_sunday() + 7 - start.weekday().num_days_from_sunday()) % 7
}

/// Two-letter weekday headers for a month grid.
pub fn weekday_labels(start: WeekStart) -> [&'static str; 7] {
    match start {
        WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
        WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub weekday_labels: [&'static str; 7],
    /// Empty cells before the first of the month.
    pub leading_blanks: usize,
    pub days: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarView {
    Month(MonthGrid),
    Week(Vec<DayCell>),
    Day(DayCell),
}

/// The date a view is looking at and how far prev/next move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub mode: ViewMode,
    pub date: NaiveDate,
    pub week_start: WeekStart,
}

impl CalendarCursor {
    pub fn new(mode: ViewMode, date: NaiveDate, week_start: WeekStart) -> Self {
        CalendarCursor {
            mode,
            date,
            week_start,
        }
    }

    pub fn prev(&mut self) {
        self.date = match self.mode {
            ViewMode::Month => first_of_month(self.date)
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.date),
            ViewMode::Week => self.date.checked_sub_days(Days::new(7)).unwrap_or(self.date),
            ViewMode::Day => self.date.pred_opt().unwrap_or(self.date),
        };
    }

    pub fn next(&mut self) {
        self.date = match self.mode {
            ViewMode::Month => first_of_month(self.date)
                .checked_add_months(Months::new(1))
                .unwrap_or(self.date),
            ViewMode::Week => self.date.checked_add_days(Days::new(7)).unwrap_or(self.date),
            ViewMode::Day => self.date.succ_opt().unwrap_or(self.date),
        };
    }

    pub fn today(&mut self, today: NaiveDate) {
        self.date = today;
    }

    pub fn title(&self) -> String {
        match self.mode {
            ViewMode::Month => self.date.format("%b %Y").to_string(),
            ViewMode::Week => {
                let start = week_start(self.date, self.week_start);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
                format!(
                    "{} - {}",
                    start.format("%b %-d"),
                    end.format("%b %-d, %Y")
                )
            }
            ViewMode::Day => self.date.format("%a, %b %-d, %Y").to_string(),
        }
    }

    /// Lay out `events` for the cursor's current position.
    pub fn build(&self, events: &[Event], options: &EmbedOptions, today: NaiveDate) -> CalendarView {
        let cell = |date: NaiveDate| DayCell {
            date,
            is_today: date == today,
            events: events_for_day(events, date, options),
        };

        match self.mode {
            ViewMode::Month => {
                let first = first_of_month(self.date);
                let days = first
                    .iter_days()
                    .take_while(|d| d.month() == first.month())
                    .map(cell)
                    .collect();
                CalendarView::Month(MonthGrid {
                    weekday_labels: weekday_labels(self.week_start),
                    leading_blanks: days_after_week_start(first, self.week_start) as usize,
                    days,
                })
            }
            ViewMode::Week => {
                let start = week_start(self.date, self.week_start);
                CalendarView::Week(start.iter_days().take(7).map(cell).collect())
            }
            ViewMode::Day => CalendarView::Day(cell(self.date)),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
