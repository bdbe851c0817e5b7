//! Core of realcal: a calendar over a vault of markdown notes.
//!
//! Notes whose frontmatter carries the `event` tag and a valid `date` are
//! events. This crate provides:
//! - `extract` for turning a note into an `Event`
//! - `cache` for the in-memory index kept in step with the vault
//! - `init` and `debounce` for loading it once and coalescing rescans
//! - `service` for the facade a host drives
//! - `view` for what month, week and day views show

pub mod cache;
pub mod constants;
pub mod date_utils;
pub mod debounce;
pub mod error;
pub mod event;
pub mod extract;
pub mod init;
pub mod metadata;
pub mod new_event;
pub mod service;
pub mod settings;
pub mod signal;
pub mod snapshot;
pub mod store;
pub mod vault;
pub mod view;

#[cfg(test)]
mod testing;

pub use cache::{EventCache, LoadOutcome};
pub use error::{RealCalError, RealCalResult};
pub use event::{Event, EventStatus};
pub use metadata::{Metadata, MetadataCodec, YamlCodec};
pub use new_event::{CreatedEvent, NewEvent};
pub use service::RealCalendar;
pub use settings::{FrontmatterField, FrontmatterFields, Settings, WeekStart};
pub use snapshot::{DataStore, JsonDataStore, Snapshot};
pub use store::{FileChange, FileRef, FileStore};
pub use vault::FsVault;
pub use view::{CalendarCursor, CalendarView, DayCell, EmbedOptions, MonthGrid, ViewMode};
