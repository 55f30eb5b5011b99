use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{FiscalScope, MoadianError};

/// Persisted counter state for one fiscal scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialRecord {
    pub fiscal_scope: FiscalScope,
    /// Last serial handed out for this scope.
    pub last_serial: u64,
}

/// Backing store for serial records.
///
/// `lock` must exclude every other holder of the same scope's lock, including
/// other processes; the returned guard releases it on drop. `persist` must be
/// atomic: either the new record is durable, or the previous one is intact.
pub trait RecordStore: Send + Sync {
    type Lock;

    fn lock(&self, scope: &FiscalScope) -> Result<Self::Lock, MoadianError>;

    fn load(&self, scope: &FiscalScope) -> Result<Option<SerialRecord>, MoadianError>;

    fn persist(&self, record: &SerialRecord) -> Result<(), MoadianError>;
}

/// One `serial_<SCOPE>.json` per scope, guarded by `serial_<SCOPE>.lock`.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    directory: PathBuf,
}

/// Exclusive advisory lock on a scope's lock file.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well
        let _ = self.file.unlock();
    }
}

impl FileRecordStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn record_path(&self, scope: &FiscalScope) -> PathBuf {
        self.directory.join(format!("serial_{scope}.json"))
    }

    pub fn lock_path(&self, scope: &FiscalScope) -> PathBuf {
        self.directory.join(format!("serial_{scope}.lock"))
    }

    fn ensure_directory(&self) -> Result<(), MoadianError> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            MoadianError::Storage(format!(
                "creating directory {}: {e}",
                self.directory.display()
            ))
        })
    }
}

impl RecordStore for FileRecordStore {
    type Lock = FileLock;

    fn lock(&self, scope: &FiscalScope) -> Result<FileLock, MoadianError> {
        self.ensure_directory()?;
        let path = self.lock_path(scope);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| MoadianError::Storage(format!("opening {}: {e}", path.display())))?;
        file.lock()
            .map_err(|e| MoadianError::Storage(format!("locking {}: {e}", path.display())))?;
        debug!(scope = %scope, "scope lock acquired");
        Ok(FileLock { file })
    }

    fn load(&self, scope: &FiscalScope) -> Result<Option<SerialRecord>, MoadianError> {
        let path = self.record_path(scope);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MoadianError::Storage(format!(
                    "reading {}: {e}",
                    path.display()
                )));
            }
        };

        let record: SerialRecord = serde_json::from_str(&text).map_err(|e| {
            warn!(scope = %scope, path = %path.display(), error = %e, "corrupt serial record");
            MoadianError::Storage(format!("corrupt record {}: {e}", path.display()))
        })?;

        if record.fiscal_scope != *scope {
            warn!(
                scope = %scope,
                found = %record.fiscal_scope,
                path = %path.display(),
                "serial record names a different scope"
            );
            return Err(MoadianError::Storage(format!(
                "corrupt record {}: holds scope {}, expected {scope}",
                path.display(),
                record.fiscal_scope
            )));
        }

        Ok(Some(record))
    }

    /// Write to a temp file in the same directory, fsync, then rename over
    /// the record.
    fn persist(&self, record: &SerialRecord) -> Result<(), MoadianError> {
        self.ensure_directory()?;
        let final_path = self.record_path(&record.fiscal_scope);

        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| MoadianError::Storage(format!("serializing record: {e}")))?;

        let temp = tempfile::NamedTempFile::new_in(&self.directory).map_err(|e| {
            MoadianError::Storage(format!(
                "creating temp file in {}: {e}",
                self.directory.display()
            ))
        })?;

        let mut file = temp.as_file();
        file.write_all(&bytes).map_err(|e| {
            MoadianError::Storage(format!(
                "writing temp file for {}: {e}",
                final_path.display()
            ))
        })?;
        file.sync_all().map_err(|e| {
            MoadianError::Storage(format!(
                "syncing temp file for {}: {e}",
                final_path.display()
            ))
        })?;

        temp.persist(&final_path).map_err(|e| {
            MoadianError::Storage(format!(
                "renaming temp file to {}: {}",
                final_path.display(),
                e.error
            ))
        })?;

        // The rename is done and cannot be rolled back, so a failed directory
        // sync is reported but not returned.
        #[cfg(unix)]
        {
            if let Err(e) = File::open(&self.directory).and_then(|dir| dir.sync_all()) {
                warn!(
                    directory = %self.directory.display(),
                    error = %e,
                    "directory sync after rename failed"
                );
            }
        }

        Ok(())
    }
}
