//! User settings persisted alongside the event snapshot.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::{is_under, normalize_path};

/// First day of the week in calendar grids. Stored as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

impl TryFrom<u8> for WeekStart {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WeekStart::Sunday),
            1 => Ok(WeekStart::Monday),
            other => Err(format!("invalid week start day {other}, expected 0 or 1")),
        }
    }
}

impl From<WeekStart> for u8 {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunday" | "sun" | "0" => Ok(WeekStart::Sunday),
            "monday" | "mon" | "1" => Ok(WeekStart::Monday),
            _ => Err(format!("Unknown week start '{}'. Expected sunday or monday", s)),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "Sunday"),
            WeekStart::Monday => write!(f, "Monday"),
        }
    }
}

/// A field written into the header of newly created events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrontmatterField {
    Tags,
    Date,
    StartTime,
    EndTime,
    Done,
}

impl FrontmatterField {
    pub const ALL: [FrontmatterField; 5] = [
        FrontmatterField::Tags,
        FrontmatterField::Date,
        FrontmatterField::StartTime,
        FrontmatterField::EndTime,
        FrontmatterField::Done,
    ];

    /// Header key for this field.
    pub fn key(self) -> &'static str {
        match self {
            FrontmatterField::Tags => "tags",
            FrontmatterField::Date => "date",
            FrontmatterField::StartTime => "startTime",
            FrontmatterField::EndTime => "endTime",
            FrontmatterField::Done => "done",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Which fields new events get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontmatterFields {
    pub tags: bool,
    pub date: bool,
    pub start_time: bool,
    pub end_time: bool,
    pub done: bool,
}

impl Default for FrontmatterFields {
    fn default() -> Self {
        FrontmatterFields {
            tags: true,
            date: true,
            start_time: true,
            end_time: true,
            done: true,
        }
    }
}

impl FrontmatterFields {
    pub fn is_enabled(&self, field: FrontmatterField) -> bool {
        match field {
            FrontmatterField::Tags => self.tags,
            FrontmatterField::Date => self.date,
            FrontmatterField::StartTime => self.start_time,
            FrontmatterField::EndTime => self.end_time,
            FrontmatterField::Done => self.done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Folder events are read from and created in. Empty scans the whole vault.
    pub event_folder: String,
    pub week_start_day: WeekStart,
    pub frontmatter_fields: FrontmatterFields,
    #[serde(deserialize_with = "deserialize_field_order")]
    pub field_order: Vec<FrontmatterField>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            event_folder: String::new(),
            week_start_day: WeekStart::Sunday,
            frontmatter_fields: FrontmatterFields::default(),
            field_order: FrontmatterField::ALL.to_vec(),
        }
    }
}

impl Settings {
    /// Repair values loaded from disk.
    pub fn normalized(mut self) -> Self {
        self.event_folder = normalize_path(&self.event_folder);
        if self.field_order.is_empty() {
            self.field_order = FrontmatterField::ALL.to_vec();
        }
        self
    }

    pub fn set_event_folder(&mut self, folder: &str) {
        self.event_folder = normalize_path(folder);
    }

    /// Whether a vault path is inside the configured event folder.
    pub fn is_in_event_folder(&self, path: &str) -> bool {
        is_under(path, &self.event_folder)
    }

    /// Fields to write for a new event, in order.
    pub fn enabled_fields(&self) -> impl Iterator<Item = FrontmatterField> + '_ {
        self.field_order
            .iter()
            .copied()
            .filter(|f| self.frontmatter_fields.is_enabled(*f))
    }
}

// Unknown names are dropped rather than failing the whole settings blob.
fn deserialize_field_order<'de, D>(deserializer: D) -> Result<Vec<FrontmatterField>, D::Error>
where
    D: Deserializer<'de>,
{
    let names: Vec<String> = Vec::deserialize(deserializer)?;
    let mut order = Vec::with_capacity(names.len());
    for field in names.iter().filter_map(|n| FrontmatterField::from_key(n)) {
        if !order.contains(&field) {
            order.push(field);
        }
    }
    Ok(order)
}
