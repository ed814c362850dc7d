use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use formstore_core::convert::{from_value, to_value};
use formstore_core::{Error, FieldPath, Result, Value};
use formstore_files::{FileInfo, FileMeta, PathForm};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StoreConfig;
use crate::field::{Field, Fields};
use crate::record::Record;

pub(crate) struct Inner {
    pub(crate) records: BTreeMap<String, Record>,
    made_file_infos: bool,
}

/// Submission id → [`Record`] map behind one reader/writer lock.
///
/// Operations that only look up or iterate take the read lock; operations
/// that insert, replace, or remove take the write lock. The lock covers the
/// whole store, not single records.
///
/// Overwriting an existing file copies its bytes after the lock is
/// released. Two concurrent uploads to the same field therefore interleave
/// on disk and the last copy to finish wins. Callers that need stronger
/// guarantees must serialize uploads per field themselves.
#[derive(Debug)]
pub struct DataStore {
    base_dir: PathBuf,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("records", &self.records.len())
            .field("made_file_infos", &self.made_file_infos)
            .finish()
    }
}

impl DataStore {
    /// Create an empty store writing uploads under `base_dir`.
    ///
    /// The directory is neither created nor checked.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_records(base_dir, BTreeMap::new())
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.base_dir.clone()))
    }

    /// Create a store pre-populated with raw records, e.g. loaded from
    /// external persistence. Call [`DataStore::on_load`] afterwards to turn
    /// file-shaped maps into live descriptors.
    pub fn with_records(
        base_dir: impl Into<PathBuf>,
        records: BTreeMap<String, BTreeMap<String, Value>>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            inner: RwLock::new(Inner {
                records: records
                    .into_iter()
                    .map(|(id, values)| (id, Record::from_values(values)))
                    .collect(),
                made_file_infos: false,
            }),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.records.is_empty())
    }

    /// Submission ids in ascending order.
    pub fn ids(&self) -> Result<Vec<String>> {
        Ok(self.read()?.records.keys().cloned().collect())
    }

    /// Run the one-time rehydration pass over every record.
    ///
    /// Returns how many descriptors were created; later calls return 0 and
    /// touch nothing.
    pub fn on_load(&self) -> Result<usize> {
        let mut inner = self.write()?;
        if inner.made_file_infos {
            return Ok(0);
        }

        let converted: usize = inner
            .records
            .values_mut()
            .map(|record| record.make_file_infos(&self.base_dir))
            .sum();
        inner.made_file_infos = true;
        log::debug!("Rehydrated {} file descriptors", converted);
        Ok(converted)
    }

    pub fn get_file(&self, id: &str, name: &str) -> Result<Arc<FileInfo>> {
        require(id, "submission id")?;
        require(name, "field name")?;

        let inner = self.read()?;
        let record = inner
            .records
            .get(id)
            .ok_or_else(|| Error::not_found(format!("record '{}'", id)))?;
        record
            .file(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("file field '{}' in record '{}'", name, id)))
    }

    /// All file fields of a record. Scalars are skipped; a missing record
    /// yields an empty map.
    pub fn get_files(&self, id: &str) -> Result<BTreeMap<String, Arc<FileInfo>>> {
        require(id, "submission id")?;

        let inner = self.read()?;
        Ok(inner
            .records
            .get(id)
            .map(|record| {
                record
                    .files()
                    .map(|(name, info)| (name.clone(), Arc::clone(info)))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Copy a stored file's bytes to `writer`.
    ///
    /// The store lock is held only for the descriptor lookup.
    pub fn stream_file(
        &self,
        id: &str,
        name: &str,
        writer: &mut dyn Write,
    ) -> Result<(u64, Arc<FileInfo>)> {
        let info = self.get_file(id, name)?;
        let copied = info.read_into(writer)?;
        Ok((copied, info))
    }

    /// Snapshot of a record. Descriptors are shared with the store, so file
    /// metadata stays live; scalar fields are copies.
    pub fn get_record(&self, id: &str) -> Result<Option<Record>> {
        self.with_record(id, |record| record.cloned())
    }

    /// Run `f` against a record while holding the read lock.
    pub fn with_record<R>(&self, id: &str, f: impl FnOnce(Option<&Record>) -> R) -> Result<R> {
        require(id, "submission id")?;
        let inner = self.read()?;
        Ok(f(inner.records.get(id)))
    }

    /// Remove a record from the index and return it.
    ///
    /// File bytes stay on disk; the returned record tells the caller which
    /// paths to clean up.
    pub fn clear_record(&self, id: &str) -> Result<Option<Record>> {
        require(id, "submission id")?;
        let removed = self.write()?.records.remove(id);
        log::debug!("Cleared record '{}' (present: {})", id, removed.is_some());
        Ok(removed)
    }

    /// Resolve a path inside a record. Missing records and fields are `None`.
    pub fn get_field(&self, id: &str, path: &FieldPath) -> Result<Option<Field>> {
        log::trace!("Looking up '{}' in record '{}'", path, id);
        self.with_record(id, |record| record.and_then(|r| r.get(path)))
    }

    /// Remove a field, or a member nested inside a scalar field.
    pub fn remove_field(&self, id: &str, path: &FieldPath) -> Result<Option<Field>> {
        require(id, "submission id")?;
        let mut inner = self.write()?;
        Ok(inner.records.get_mut(id).and_then(|r| r.remove(path)))
    }

    /// Set a field, or a member nested inside a scalar field, creating the
    /// record and intermediate maps as needed.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty id or path, a nested path under a file
    /// field, or a path that runs through a non-container value.
    pub fn set_field(&self, id: &str, path: &FieldPath, value: Value) -> Result<()> {
        require(id, "submission id")?;
        log::trace!("Setting '{}' in record '{}'", path, id);
        let mut inner = self.write()?;
        match inner.records.get_mut(id) {
            Some(record) => record.set(path, value),
            None => {
                let mut record = Record::new();
                record.set(path, value)?;
                inner.records.insert(id.to_string(), record);
                Ok(())
            }
        }
    }

    /// Merge the top-level members of a serializable value into a record.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `data` does not serialize to a map.
    pub fn put_serialized<T: Serialize>(&self, id: &str, data: &T) -> Result<()> {
        match to_value(data)? {
            Value::Map(map) => self.put_record(
                id,
                map.into_iter().map(|(k, v)| (k, Field::Scalar(v))).collect(),
            ),
            other => Err(Error::invalid_argument(format!(
                "expected a map of fields, got {:?}",
                other
            ))),
        }
    }

    /// Deserialize a record into `T`. Files appear as full descriptor maps.
    pub fn record_as<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let value = self.with_record(id, |record| record.map(|r| r.to_value(PathForm::Full)))?;
        value.map(from_value).transpose()
    }

    /// Merge `fields` into a record, creating it if needed.
    pub fn put_record(&self, id: &str, fields: Fields) -> Result<()> {
        require(id, "submission id")?;
        log::debug!("Merging {} fields into record '{}'", fields.len(), id);
        self.write()?
            .records
            .entry(id.to_string())
            .or_default()
            .merge_with(fields);
        Ok(())
    }

    /// Replace a record wholesale.
    pub fn replace_record(&self, id: &str, fields: Fields) -> Result<()> {
        require(id, "submission id")?;
        log::debug!("Replacing record '{}' with {} fields", id, fields.len());
        self.write()?
            .records
            .insert(id.to_string(), Record::from(fields));
        Ok(())
    }

    /// Store an upload under a record field and return the bytes written.
    ///
    /// A new field gets a fresh descriptor, written while the write lock is
    /// held and inserted only if the write succeeds; a partial file left by a
    /// failed write is removed. An existing file field keeps its descriptor
    /// and path: the lock is released, then the metadata is updated and the
    /// bytes overwritten.
    ///
    /// `reader` runs under the store's write lock for a new field. If it
    /// panics there the lock is poisoned and every later call on this store
    /// returns [`Error::LockPoisoned`].
    pub fn put_file(
        &self,
        id: &str,
        name: &str,
        meta: FileMeta,
        reader: &mut dyn Read,
    ) -> Result<u64> {
        require(id, "submission id")?;
        require(name, "field name")?;

        let existing = {
            let mut inner = self.write()?;
            match inner.records.get(id).and_then(|r| r.file(name)).cloned() {
                Some(info) => info,
                None => {
                    let info = FileInfo::new(&self.base_dir, meta);
                    let written = match info.write(reader) {
                        Ok(written) => written,
                        Err(err) => {
                            discard_partial(&info.path());
                            return Err(err);
                        }
                    };
                    log::debug!(
                        "Stored new file '{}' for record '{}' at {}",
                        name,
                        id,
                        info.path().display()
                    );
                    inner
                        .records
                        .entry(id.to_string())
                        .or_default()
                        .insert(name, info);
                    return Ok(written);
                }
            }
        };

        existing.update(meta.name, meta.content_type);
        let written = existing.write(reader)?;
        log::debug!(
            "Overwrote file '{}' for record '{}' at {}",
            name,
            id,
            existing.path().display()
        );
        Ok(written)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(Error::lock_poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(Error::lock_poisoned)
    }
}

fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial upload {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial upload {}: {}", path.display(), e),
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_argument(format!("empty {}", what)));
    }
    Ok(())
}
