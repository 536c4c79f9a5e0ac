//! Purpose: Polymorphic record-store interface and the handle the shell holds.
//! Exports: `RecordStore`, `StoreHandle`, `open_store`, `create_store_file`.
//! Role: Chooses the tabular or structured variant once, from the file suffix.
//! Invariants: Positions are 0-based; out-of-range positions never mutate the file.
//! Invariants: No file handle is held between operations.
//! Invariants: Whole-file rewrites are all-or-nothing (see `core::atomic`).
use std::fs::{self, OpenOptions};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind, io_error};
use crate::core::format::Format;
use crate::core::record::Record;
use crate::core::structured::StructuredStore;
use crate::core::tabular::TabularStore;

pub trait RecordStore {
    fn path(&self) -> &Path;

    fn format(&self) -> Format;

    /// All records in on-disk order.
    fn load(&self) -> Result<Vec<Record>, Error>;

    /// Field names for a "new record" prompt, or `None` when the file holds none yet.
    fn field_names(&self) -> Result<Option<Vec<String>>, Error>;

    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Removes the record at `index` and returns how many were removed (0 or 1).
    fn delete_at(&self, index: usize) -> Result<usize, Error>;

    fn replace_record_at(&self, index: usize, record: &Record) -> Result<(), Error>;

    /// Rejects records the variant will not accept as new entries.
    fn check_new_record(&self, record: &Record) -> Result<(), Error>;

    fn get_record_at(&self, index: usize) -> Result<Record, Error> {
        let mut records = self.load()?;
        if index >= records.len() {
            return Err(record_not_found(self.path(), index, records.len()));
        }
        Ok(records.swap_remove(index))
    }
}

/// The active (path, format) pair plus the store that serves it.
pub struct StoreHandle {
    store: Box<dyn RecordStore>,
}

impl StoreHandle {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self {
            store: open_store(path)?,
        })
    }
}

impl Deref for StoreHandle {
    type Target = dyn RecordStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

pub fn open_store(path: impl Into<PathBuf>) -> Result<Box<dyn RecordStore>, Error> {
    let path = path.into();
    let store: Box<dyn RecordStore> = match Format::from_path(&path)? {
        Format::Tabular => Box::new(TabularStore::new(path)),
        Format::Structured => Box::new(StructuredStore::new(path)),
    };
    Ok(store)
}

/// Creates `path` holding the empty form of its format. Existing files are left alone.
pub fn create_store_file(path: &Path) -> Result<Format, Error> {
    let format = Format::from_path(path)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                Error::new(ErrorKind::Usage)
                    .with_message("file already exists")
                    .with_path(path)
                    .with_source(err)
            } else {
                io_error(path, err)
            }
        })?;
    io::Write::write_all(&mut file, format.empty_contents().as_bytes())
        .map_err(|err| io_error(path, err))?;
    tracing::info!(path = %path.display(), format = %format, "created store file");
    Ok(format)
}

/// Reads the whole file as UTF-8; `Ok(None)` when it does not exist.
pub(crate) fn read_text(path: &Path) -> Result<Option<String>, Error> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::InvalidData => Err(Error::new(ErrorKind::Format)
            .with_message("file is not valid UTF-8")
            .with_path(path)
            .with_source(err)),
        Err(err) => Err(io_error(path, err)),
    }
}

pub(crate) fn record_not_found(path: &Path, index: usize, len: usize) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("no record at position {} ({len} records)", index + 1))
        .with_path(path)
        .with_index(index)
}
