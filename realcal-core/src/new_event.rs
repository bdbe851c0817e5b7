//! Creating event notes.

use serde::Serialize;
use tracing::info;

use crate::constants::EVENT_TAG;
use crate::date_utils::{is_valid_date, is_valid_time, is_valid_time_range};
use crate::error::{RealCalError, RealCalResult};
use crate::metadata::{Metadata, MetadataCodec};
use crate::settings::{FrontmatterField, Settings};
use crate::store::{FileRef, FileStore, join_path};

/// User input for a new event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Result of [`create_event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEvent {
    pub file: FileRef,
    /// Whether a numeric suffix was added because the name was taken.
    pub renamed: bool,
}

impl NewEvent {
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        NewEvent {
            name: name.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn with_start_time(mut self, time: impl Into<String>) -> Self {
        self.start_time = Some(time.into());
        self
    }

    pub fn with_end_time(mut self, time: impl Into<String>) -> Self {
        self.end_time = Some(time.into());
        self
    }

    fn start(&self) -> Option<&str> {
        non_empty(self.start_time.as_deref())
    }

    fn end(&self) -> Option<&str> {
        non_empty(self.end_time.as_deref())
    }

    /// Check the input before anything is written.
    pub fn validate(&self) -> RealCalResult<()> {
        let invalid = |msg: &str| Err(RealCalError::InvalidInput(msg.to_string()));

        if self.name.trim().is_empty() {
            return invalid("Please enter an event name");
        }
        let date = self.date.trim();
        if date.is_empty() {
            return invalid("Please enter a date");
        }
        if !is_valid_date(date) {
            return invalid("Invalid date. Please check month and day values.");
        }
        if self.start().is_some_and(|t| !is_valid_time(t)) {
            return invalid("Invalid start time. Use HH:MM (00:00 - 23:59)");
        }
        if self.end().is_some_and(|t| !is_valid_time(t)) {
            return invalid("Invalid end time. Use HH:MM (00:00 - 23:59)");
        }
        if let (Some(start), Some(end)) = (self.start(), self.end()) {
            if !is_valid_time_range(start, end) {
                return invalid("End time must be after start time");
            }
        }
        Ok(())
    }

    /// The header block for the new note, fields in the configured order.
    ///
    /// Times are written double-quoted so YAML 1.1 readers keep them as
    /// strings instead of sexagesimal numbers.
    pub fn frontmatter(&self, settings: &Settings, codec: &dyn MetadataCodec) -> RealCalResult<String> {
        self.validate()?;

        let mut body = String::new();
        for field in settings.enabled_fields() {
            let value = match field {
                FrontmatterField::Tags => Metadata::String(EVENT_TAG.into()),
                FrontmatterField::Date => Metadata::String(self.date.trim().into()),
                FrontmatterField::StartTime | FrontmatterField::EndTime => {
                    let time = if field == FrontmatterField::StartTime {
                        self.start()
                    } else {
                        self.end()
                    };
                    if let Some(time) = time {
                        body.push_str(&format!("{}: \"{}\"\n", field.key(), time));
                    }
                    continue;
                }
                FrontmatterField::Done => Metadata::Bool(false),
            };

            let line = codec.encode(&Metadata::Map(vec![(field.key().to_string(), value)]))?;
            body.push_str(&line);
            if !line.ends_with('\n') {
                body.push('\n');
            }
        }

        Ok(format!("---\n{body}---\n"))
    }

    /// File stem derived from the name, with path-unsafe characters replaced.
    pub fn file_stem(&self) -> String {
        sanitize_file_name(&self.name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Replace characters that can't appear in a note name with `-`.
pub fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect()
}

/// Validate `event` and write it as a new note in the event folder.
///
/// When a note with the same name exists, `-1`, `-2`, ... is appended until
/// a free path is found.
pub async fn create_event(
    store: &dyn FileStore,
    codec: &dyn MetadataCodec,
    settings: &Settings,
    event: &NewEvent,
) -> RealCalResult<CreatedEvent> {
    event.validate()?;
    let content = event.frontmatter(settings, codec)?;

    let folder = &settings.event_folder;
    let stem = event.file_stem();

    let mut path = join_path(folder, &format!("{stem}.md"));
    let mut counter = 1;
    while store.exists(&path).await {
        path = join_path(folder, &format!("{stem}-{counter}.md"));
        counter += 1;
    }

    if !folder.is_empty() && !store.exists(folder).await {
        store.create_folder(folder).await?;
    }

    let file = store.create(&path, &content).await?;
    info!(path = %file.path, "created event");

    Ok(CreatedEvent {
        file,
        renamed: counter > 1,
    })
}
