//! Persisting trees as JSON snapshot files.
//!
//! A snapshot records the universe and the stored values in ascending order. Every access goes
//! through an advisory lock on the sidecar `<name>.lock` file. Saving holds it exclusively while
//! a sibling `*.tmp` file is written, synced and renamed over the target. Loading holds it
//! shared, so a reader never observes a half-written snapshot.

use crate::error::{IoDirection, SnapshotError, SnapshotErrorSource, VebError};
use crate::tree::VebTree;
use fs4::fs_std::FileExt;
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TreeSnapshot {
    pub universe: u64,
    pub len: u64,
    pub created_at: String,
    pub values: Vec<u64>,
}

impl VebTree {
    /// Captures the tree's contents as a serializable snapshot.
    pub fn to_snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            universe: self.universe(),
            len: self.len(),
            created_at: chrono::Utc::now().to_rfc3339(),
            values: self.iter().collect(),
        }
    }

    /// Rebuilds a tree from a snapshot.
    ///
    /// # Errors
    ///
    /// [`VebError::UniverseTooSmall`] for an invalid universe, and a
    /// [`SnapshotError::DataCorruption`] when values are unordered, duplicated, out of range, or
    /// disagree with the recorded length.
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Result<VebTree, VebError> {
        let mut tree = VebTree::new(snapshot.universe)?;

        chrono::DateTime::parse_from_rfc3339(&snapshot.created_at)
            .map_err(|e| SnapshotError::from_serialization_error(e, "snapshot created_at"))?;

        if snapshot.len != snapshot.values.len() as u64 {
            return Err(SnapshotError::DataCorruption {
                context: "snapshot".to_string(),
                details: format!(
                    "recorded len {} but found {} values",
                    snapshot.len,
                    snapshot.values.len()
                ),
            }
            .into());
        }

        let mut previous: Option<u64> = None;
        for value in snapshot.values {
            if previous.is_some_and(|prev| value <= prev) {
                return Err(SnapshotError::DataCorruption {
                    context: "snapshot".to_string(),
                    details: format!("value {value} is not in strictly ascending order"),
                }
                .into());
            }
            if value >= snapshot.universe {
                return Err(SnapshotError::DataCorruption {
                    context: "snapshot".to_string(),
                    details: format!(
                        "value {value} is out of range for universe {}",
                        snapshot.universe
                    ),
                }
                .into());
            }
            tree.try_insert(value)?;
            previous = Some(value);
        }

        Ok(tree)
    }
}

/// A snapshot file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SnapshotFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling_path(".lock")
    }

    /// Writes the tree, replacing any previous snapshot. Blocks while another save, load or
    /// [`update`](Self::update) on the same path holds the lock.
    #[tracing::instrument(level = "debug", skip(self, tree), fields(path = ?self.path, len = tree.len()))]
    pub fn save(&self, tree: &VebTree) -> Result<(), VebError> {
        self.ensure_parent_directory_exists()?;
        let _lock = self.acquire_lock(LockMode::Exclusive)?;
        self.write_locked(tree)
    }

    /// Reads the snapshot. Blocks while a save or [`update`](Self::update) holds the lock.
    #[tracing::instrument(level = "debug", skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> Result<VebTree, VebError> {
        let _lock = self.acquire_lock(LockMode::Shared)?;
        self.read_locked()
    }

    /// Loads the snapshot, applies `f` and saves the result under one exclusive lock. Nothing is
    /// written when `f` fails.
    #[tracing::instrument(level = "debug", skip(self, f), fields(path = ?self.path))]
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut VebTree) -> Result<R, VebError>,
    ) -> Result<R, VebError> {
        let _lock = self.acquire_lock(LockMode::Exclusive)?;
        let mut tree = self.read_locked()?;
        let result = f(&mut tree)?;
        self.write_locked(&tree)?;
        Ok(result)
    }

    /// Loads the snapshot if the file exists, otherwise returns an empty tree. Nothing is
    /// written until [`save`](Self::save) is called.
    pub fn load_or_create(&self, universe: u64) -> Result<VebTree, VebError> {
        if self.exists() {
            self.load()
        } else {
            debug!("No snapshot at {:?}, starting empty tree", self.path);
            VebTree::new(universe)
        }
    }

    fn ensure_parent_directory_exists(&self) -> Result<(), VebError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SnapshotError::from_io_error(
                        e,
                        IoDirection::Write,
                        "Failed to create snapshot directory",
                    )
                })?;
            }
        }
        Ok(())
    }

    /// Opens the sidecar lock file and blocks until the lock is granted. The lock is released
    /// when the returned file is dropped.
    fn acquire_lock(&self, mode: LockMode) -> Result<File, VebError> {
        let lock_path = self.lock_path();
        let lock_file = create_lock_file(&lock_path, mode)?;

        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&lock_file),
            LockMode::Exclusive => FileExt::lock_exclusive(&lock_file),
        };
        if locked.is_err() {
            return Err(SnapshotError::LockAcquisitionFailed {
                context: lock_path.display().to_string(),
            }
            .into());
        }

        if mode == LockMode::Exclusive {
            write_lock_metadata(&lock_file)?;
        }
        Ok(lock_file)
    }

    fn write_locked(&self, tree: &VebTree) -> Result<(), VebError> {
        let snapshot = tree.to_snapshot();
        let tmp_path = self.temp_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| {
                SnapshotError::from_io_error(
                    e,
                    IoDirection::Write,
                    "Failed to open temporary snapshot file",
                )
            })?;

        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, &snapshot).map_err(|e| {
            SnapshotError::WriteFailed {
                context: "serialize snapshot".to_string(),
                source: Box::new(SnapshotErrorSource::Serialization(e.to_string())),
            }
        })?;
        writer.flush().map_err(|e| {
            SnapshotError::from_io_error(e, IoDirection::Write, "Failed to flush snapshot")
        })?;
        drop(writer);

        file.sync_all().map_err(|e| {
            SnapshotError::from_io_error(e, IoDirection::Write, "Failed to sync snapshot")
        })?;
        drop(file);

        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                warn!("Failed to remove temporary snapshot {tmp_path:?}: {cleanup}");
            }
            return Err(SnapshotError::from_io_error(
                e,
                IoDirection::Write,
                "Failed to move snapshot into place",
            )
            .into());
        }

        debug!(
            "Saved snapshot of {} values (universe {}) to {:?}",
            snapshot.len, snapshot.universe, self.path
        );
        Ok(())
    }

    fn read_locked(&self) -> Result<VebTree, VebError> {
        let context = self.path.display().to_string();
        let file = File::open(&self.path)
            .map_err(|e| SnapshotError::from_io_error(e, IoDirection::Read, &context))?;

        let snapshot: TreeSnapshot = serde_json::from_reader(BufReader::new(&file))
            .map_err(|e| decode_error(e, &context))?;

        let tree = VebTree::from_snapshot(snapshot)?;
        debug!(
            "Loaded snapshot of {} values (universe {}) from {:?}",
            tree.len(),
            tree.universe(),
            self.path
        );
        Ok(tree)
    }
}

fn create_lock_file(lock_path: &Path, mode: LockMode) -> Result<File, VebError> {
    let direction = match mode {
        LockMode::Shared => IoDirection::Read,
        LockMode::Exclusive => IoDirection::Write,
    };
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| {
            SnapshotError::from_io_error(e, direction, "Failed to open snapshot lock file").into()
        })
}

fn write_lock_metadata(lock_file: &File) -> Result<(), VebError> {
    let pid = std::process::id();
    let timestamp = chrono::Utc::now().to_rfc3339();
    let lock_info = format!("PID: {pid}\nTimestamp: {timestamp}\n");

    let _ = lock_file.set_len(0);
    (&*lock_file).write_all(lock_info.as_bytes()).map_err(|e| {
        SnapshotError::from_io_error(e, IoDirection::Write, "Failed to write lock metadata").into()
    })
}

/// Read failures surfacing through the JSON decoder are I/O errors, not corruption.
fn decode_error(e: serde_json::Error, context: &str) -> SnapshotError {
    if e.is_io() {
        SnapshotError::from_io_error(e.into(), IoDirection::Read, context)
    } else {
        SnapshotError::from_serialization_error(e, context)
    }
}
