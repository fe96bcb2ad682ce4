use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{Announcement, Area, Complaint, Technician, User};

/// Every collection the tracker owns, read and written as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub complaints: Vec<Complaint>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub technicians: Vec<Technician>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub sequences: Sequences,
}

/// Persisted high-water marks for id allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    #[serde(default)]
    pub users: u64,
    #[serde(default)]
    pub complaints: u64,
    #[serde(default)]
    pub announcements: u64,
}

fn advance(counter: &mut u64, max_existing: Option<u64>) -> u64 {
    let next = (*counter).max(max_existing.unwrap_or(0)) + 1;
    *counter = next;
    next
}

impl Snapshot {
    pub fn next_user_id(&mut self) -> u64 {
        let max = self.users.iter().map(|user| user.id).max();
        advance(&mut self.sequences.users, max)
    }

    pub fn next_complaint_id(&mut self) -> u64 {
        let max = self.complaints.iter().map(|complaint| complaint.id).max();
        advance(&mut self.sequences.complaints, max)
    }

    pub fn next_announcement_id(&mut self) -> u64 {
        let max = self.announcements.iter().map(|item| item.id).max();
        advance(&mut self.sequences.announcements, max)
    }

    pub fn find_user_by_phone(&self, phone: &str) -> Option<&User> {
        self.users.iter().find(|user| user.phone == phone)
    }

    pub fn complaints_for_user(&self, user_id: u64) -> Vec<Complaint> {
        self.complaints
            .iter()
            .filter(|complaint| complaint.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn complaints_in_area(&self, area: &str) -> Vec<Complaint> {
        self.complaints
            .iter()
            .filter(|complaint| complaint.area == area)
            .cloned()
            .collect()
    }

    pub fn active_announcements(&self) -> Vec<Announcement> {
        self.announcements
            .iter()
            .filter(|announcement| announcement.active)
            .cloned()
            .collect()
    }

    pub fn complaint_mut(&mut self, id: u64) -> Option<&mut Complaint> {
        self.complaints.iter_mut().find(|complaint| complaint.id == id)
    }

    pub fn announcement_mut(&mut self, id: u64) -> Option<&mut Announcement> {
        self.announcements
            .iter_mut()
            .find(|announcement| announcement.id == id)
    }
}

/// Whole-snapshot persistence so the backing medium can change without touching callers.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("snapshot i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Single JSON document on disk. Writes go to a sibling temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write `seed` only when no data file exists yet. Returns whether it was written.
    pub fn initialize_if_missing(&self, seed: &Snapshot) -> Result<bool, StoreError> {
        if self.exists() {
            debug!(path = %self.path.display(), "snapshot present, skipping seed");
            return Ok(false);
        }
        self.save(seed)?;
        info!(
            path = %self.path.display(),
            users = seed.users.len(),
            complaints = seed.complaints.len(),
            "initialized snapshot with seed data"
        );
        Ok(true)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let temp = self.temp_path();
        let replaced = write_synced(&temp, &encoded).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(err) = replaced {
            if let Err(cleanup) = fs::remove_file(&temp) {
                debug!(path = %temp.display(), error = %cleanup, "temp snapshot not removed");
            }
            return Err(self.io_error(err));
        }

        debug!(path = %self.path.display(), bytes = encoded.len(), "snapshot saved");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
