//! Persisted settings and event cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::constants::{DATA_DIR, DATA_FILE};
use crate::error::{RealCalError, RealCalResult};
use crate::event::Event;
use crate::settings::Settings;

/// Everything the calendar persists: settings plus the last known events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default, deserialize_with = "deserialize_events")]
    pub events: Vec<Event>,
}

// A malformed entry only loses that entry; the staleness check catches the gap.
fn deserialize_events<'de, D>(deserializer: D) -> Result<Vec<Event>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "dropping malformed cached event");
                None
            }
        })
        .collect())
}

/// Key-value blob storage for the snapshot.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Load the snapshot, `None` if nothing was saved yet.
    async fn load(&self) -> RealCalResult<Option<Snapshot>>;

    async fn save(&self, snapshot: &Snapshot) -> RealCalResult<()>;
}

/// Snapshot stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonDataStore {
    path: PathBuf,
}

impl JsonDataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonDataStore { path: path.into() }
    }

    /// The default location inside a vault: `.realcal/data.json`.
    pub fn for_vault(vault_root: &Path) -> Self {
        Self::new(vault_root.join(DATA_DIR).join(DATA_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataStore for JsonDataStore {
    async fn load(&self) -> RealCalResult<Option<Snapshot>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|e| RealCalError::Serialization(e.to_string()))?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> RealCalResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| RealCalError::Serialization(e.to_string()))?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
