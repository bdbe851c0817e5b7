//! Tunable constants.

use std::time::Duration;

/// Tag value that marks a note as an event.
pub const EVENT_TAG: &str = "event";

/// Number of files read concurrently during a full rescan.
pub const RESCAN_BATCH_SIZE: usize = 20;

/// Quiet period after the last rename before the vault is rescanned.
pub const RESCAN_DEBOUNCE: Duration = Duration::from_secs(10);

/// Delay before a snapshot restored at startup is checked against the vault.
pub const STALE_CHECK_DELAY: Duration = Duration::from_secs(3);

/// Folder (relative to the vault root) holding the persisted snapshot.
pub const DATA_DIR: &str = ".realcal";

/// Snapshot file name inside [`DATA_DIR`].
pub const DATA_FILE: &str = "data.json";

/// Vault-local trash folder used for non-permanent deletes.
pub const TRASH_DIR: &str = ".trash";
