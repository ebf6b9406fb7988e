//! Persistence for the booking document.
//!
//! The whole dataset lives in one JSON file. Writers run their
//! read-modify-write cycle under an in-process mutex plus an advisory
//! lock on a sibling `.lock` file, and publish the new document by
//! renaming a temp file over the old one. Readers never block and can
//! only ever observe a complete document.

use crate::error::{BookingError, StoreError};
use crate::types::BookingData;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Unable to create data directory {:?}: {}", parent, err);
                }
            }
        }

        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read the current document without taking any lock.
    ///
    /// A missing, empty or unparseable file yields the empty document,
    /// so a fresh deployment needs no setup step.
    pub fn read(&self) -> BookingData {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return BookingData::default(),
            Err(err) => {
                tracing::warn!(
                    "Unable to read data file {:?}: {}. Using empty data.",
                    self.path,
                    err
                );
                return BookingData::default();
            }
        };

        if contents.trim().is_empty() {
            return BookingData::default();
        }

        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse data file {:?}: {}. Using empty data.",
                    self.path,
                    err
                );
                BookingData::default()
            }
        }
    }

    /// Run `transform` over the current document and persist the result.
    ///
    /// The cycle is exclusive: concurrent calls are serialized, first by
    /// the in-process mutex, then by the advisory file lock. When the
    /// transform returns `Err` nothing is written and the error is
    /// passed through to the caller.
    pub fn update<T>(
        &self,
        transform: impl FnOnce(&mut BookingData) -> Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        let _guard = self.write_lock.lock().unwrap();
        let _lock_file = self.acquire_file_lock()?;

        let mut data = self.read();
        let value = transform(&mut data)?;
        self.persist(&data)?;

        Ok(value)
    }

    fn acquire_file_lock(&self) -> Result<File, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.lock_path)?;

        let deadline = Instant::now() + LOCK_TIMEOUT;
        while file.try_lock_exclusive().is_err() {
            if Instant::now() >= deadline {
                return Err(StoreError::LockTimeout);
            }
            std::thread::sleep(LOCK_RETRY_INTERVAL);
        }

        Ok(file)
    }

    fn persist(&self, data: &BookingData) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(data)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}
