//! Calendar events derived from notes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date_utils::format_date;
use crate::store::FileRef;

/// A calendar entry backed by one note.
///
/// The note's path is the event's identity; everything else is re-read from
/// the note whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// `YYYY-MM-DD`
    pub date: String,
    pub title: String,
    pub file: FileRef,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// How an event should be presented relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Done,
    Overdue,
    Upcoming,
}

impl Event {
    pub fn path(&self) -> &str {
        &self.file.path
    }

    pub fn status(&self, today: NaiveDate) -> EventStatus {
        if self.done {
            EventStatus::Done
        } else if self.date < format_date(today) {
            EventStatus::Overdue
        } else {
            EventStatus::Upcoming
        }
    }

    /// Short label used in grid cells, e.g. `14:00 Team sync`.
    pub fn label(&self) -> String {
        match &self.start_time {
            Some(start) => format!("{} {}", start, self.title),
            None => self.title.clone(),
        }
    }

    /// Time span label for the day view.
    pub fn time_label(&self) -> Option<String> {
        match (&self.start_time, &self.end_time) {
            (Some(start), Some(end)) => Some(format!("{} - {}", start, end)),
            (Some(start), None) => Some(start.clone()),
            (None, Some(end)) => Some(format!("Until {}", end)),
            (None, None) => None,
        }
    }
}
