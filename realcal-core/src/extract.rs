//! Turning a note into an event.

use tracing::debug;

use crate::constants::EVENT_TAG;
use crate::date_utils::{format_date, parse_date};
use crate::error::RealCalResult;
use crate::event::Event;
use crate::metadata::{Metadata, MetadataCodec};
use crate::store::{FileRef, FileStore};

/// Split a note into its `---` delimited header and the body after it.
///
/// The opening marker must be the very first line. Returns `None` when the
/// note has no complete header.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == "---" {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }

    None
}

/// Build an event from a note's content, or `None` if the note isn't one.
pub fn extract_event(file: &FileRef, content: &str, codec: &dyn MetadataCodec) -> Option<Event> {
    let (header, _) = split_frontmatter(content)?;

    let meta = match codec.decode(header) {
        Ok(meta) => meta,
        Err(e) => {
            debug!(path = %file.path, error = %e, "skipping note with unreadable header");
            return None;
        }
    };

    if !meta.get("tags").is_some_and(|tags| tags.contains_tag(EVENT_TAG)) {
        return None;
    }

    let date = match meta.get("date")? {
        Metadata::Date(d) => format_date(*d),
        Metadata::String(s) => s.trim().to_string(),
        _ => return None,
    };
    parse_date(&date)?;

    Some(Event {
        date,
        title: file.basename().to_string(),
        file: file.clone(),
        done: meta.get("done").is_some_and(Metadata::is_truthy),
        start_time: time_field(&meta, "startTime"),
        end_time: time_field(&meta, "endTime"),
    })
}

fn time_field(meta: &Metadata, key: &str) -> Option<String> {
    meta.get(key)
        .filter(|value| value.is_truthy())
        .and_then(Metadata::to_plain_string)
        .map(|s| s.trim().to_string())
}

/// Read a note from the store and extract its event.
///
/// Read failures are returned as errors so callers can tell "not an event"
/// apart from "could not look".
pub async fn read_event(
    store: &dyn FileStore,
    codec: &dyn MetadataCodec,
    file: &FileRef,
) -> RealCalResult<Option<Event>> {
    let content = store.read(file).await?;
    Ok(extract_event(file, &content, codec))
}
