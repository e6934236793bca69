//! # Room Store
//!
//! Persistent per-room state (`RoomRecord`), keyed by room id and saved as JSON.
//! Provided to other extensions as a host service by the `database` extension.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::strings::logs;

/// State for a single chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Whether the bot is active in this room.
    pub running: bool,
    /// Unix timestamp of when the room was registered.
    #[serde(default)]
    pub joined_at: i64,
}

impl RoomRecord {
    fn new() -> Self {
        Self {
            running: true,
            joined_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    rooms: BTreeMap<String, RoomRecord>,
}

#[derive(Debug)]
pub struct RoomStore {
    path: PathBuf,
    rooms: Mutex<BTreeMap<String, RoomRecord>>,
}

impl RoomStore {
    /// Loads the store from `path`. A missing file is an empty store; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let rooms = match fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str::<StoreFile>(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
                    .rooms
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        tracing::info!("{}", logs::store_loaded(&path.display().to_string(), rooms.len()));
        Ok(Self {
            path: path.to_path_buf(),
            rooms: Mutex::new(rooms),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers `room_id` as running unless it is already known.
    pub async fn ensure(&self, room_id: &str) -> RoomRecord {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(RoomRecord::new)
            .clone()
    }

    /// Drops whatever was stored for `room_id` and registers it afresh.
    pub async fn reinit(&self, room_id: &str) -> RoomRecord {
        let mut rooms = self.rooms.lock().await;
        let record = RoomRecord::new();
        rooms.insert(room_id.to_string(), record.clone());
        record
    }

    pub async fn running(&self, room_id: &str) -> Option<bool> {
        self.rooms.lock().await.get(room_id).map(|r| r.running)
    }

    pub async fn set_running(&self, room_id: &str, running: bool) {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.to_string())
            .or_insert_with(RoomRecord::new)
            .running = running;
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Persists the store to its file.
    pub async fn save(&self) -> Result<()> {
        let file = StoreFile {
            rooms: self.rooms.lock().await.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
