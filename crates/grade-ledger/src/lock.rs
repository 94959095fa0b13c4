//! Scoped advisory locks on the table file
//!
//! Writers hold `flock(LOCK_EX)` for the whole read-modify-write; readers
//! take `flock(LOCK_SH)`. The lock is released when the guard drops, so every
//! early return (validation failure, missing record, IO error) unlocks.
//!
//! The rewrite truncates the file in place. A crash between truncate and the
//! final write leaves a short file; nothing here attempts recovery.

use crate::error::{LedgerError, LedgerResult, StorageOp};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Locked handle on the table file
#[derive(Debug)]
pub(crate) struct TableLock {
    file: File,
    path: PathBuf,
}

impl TableLock {
    /// Open read-only under a shared lock; `None` if the file is missing
    pub(crate) fn shared(path: &Path) -> LedgerResult<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::storage(StorageOp::Open, path, e)),
        };

        FileExt::lock_shared(&file).map_err(|e| LedgerError::storage(StorageOp::Lock, path, e))?;
        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    /// Open read-write under an exclusive lock
    ///
    /// With `create` the file is created when missing; otherwise a missing
    /// file yields `None`.
    pub(crate) fn exclusive(path: &Path, create: bool) -> LedgerResult<Option<Self>> {
        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .truncate(false)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if !create && e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::storage(StorageOp::Open, path, e)),
        };

        FileExt::lock_exclusive(&file)
            .map_err(|e| LedgerError::storage(StorageOp::Lock, path, e))?;
        tracing::trace!("Locked {} exclusively", path.display());
        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    /// Read the whole file from the start
    pub(crate) fn read_to_string(&mut self) -> LedgerResult<String> {
        let mut text = String::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut text))
            .map_err(|e| LedgerError::storage(StorageOp::Read, &self.path, e))?;
        Ok(text)
    }

    /// Replace the file contents
    pub(crate) fn rewrite(&mut self, contents: &str) -> LedgerResult<()> {
        overwrite(&mut self.file, contents).map_err(|e| {
            let err = LedgerError::storage(StorageOp::Write, &self.path, e);
            tracing::warn!("Failed to rewrite grade table: {}", err);
            err
        })
    }
}

fn overwrite(file: &mut File, contents: &str) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.sync_data()
}

impl Drop for TableLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!("Unlock of {} failed: {}", self.path.display(), e);
        }
    }
}
