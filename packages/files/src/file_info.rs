use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use formstore_core::{Error, Result, Value};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::meta::{FileMeta, PathForm, KEY_CONTENT_TYPE, KEY_NAME, KEY_PATH, KEY_SIZE};

/// One uploaded file: metadata plus a stable location on disk.
///
/// The location (`base_dir` + `id`) is fixed at construction. Metadata sits
/// behind its own lock so a descriptor shared through an `Arc` can be
/// updated in place when the file is overwritten. The bytes themselves are
/// not locked: two concurrent `write` calls on one descriptor interleave and
/// the last one to finish wins.
#[derive(Debug)]
pub struct FileInfo {
    base_dir: PathBuf,
    id: String,
    meta: RwLock<FileMeta>,
}

impl FileInfo {
    /// Create a descriptor with a fresh UUID v4 location under `base_dir`.
    ///
    /// Nothing is written until [`FileInfo::write`] is called.
    pub fn new(base_dir: impl Into<PathBuf>, meta: FileMeta) -> Self {
        Self {
            base_dir: base_dir.into(),
            id: Uuid::new_v4().to_string(),
            meta: RwLock::new(meta),
        }
    }

    /// The generated file name under the base directory.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute location of the bytes.
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.id)
    }

    /// Snapshot of the current metadata.
    pub fn meta(&self) -> FileMeta {
        self.read_meta().clone()
    }

    pub fn name(&self) -> String {
        self.read_meta().name.clone()
    }

    pub fn content_type(&self) -> String {
        self.read_meta().content_type.clone()
    }

    pub fn size(&self) -> u64 {
        self.read_meta().size
    }

    /// Replace name and content type. The bytes are left alone.
    pub fn update(&self, name: impl Into<String>, content_type: impl Into<String>) {
        let mut meta = self.write_meta();
        meta.name = name.into();
        meta.content_type = content_type.into();
    }

    /// Copy `reader` to disk, replacing any previous content, and record the
    /// new size.
    ///
    /// Returns the number of bytes written. If the copy fails after the file
    /// was truncated, the recorded size is set to what is left on disk.
    pub fn write(&self, reader: &mut dyn Read) -> Result<u64> {
        let path = self.path();
        log::debug!("Writing {}...", path.display());

        let mut file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let copied = io::copy(reader, &mut file).and_then(|n| file.flush().map(|()| n));
        let written = match copied {
            Ok(written) => written,
            Err(e) => {
                let on_disk = file.metadata().map(|m| m.len()).unwrap_or(0);
                self.write_meta().size = on_disk;
                log::warn!(
                    "Write to {} failed after {} bytes: {}",
                    path.display(),
                    on_disk,
                    e
                );
                return Err(Error::io(&path, e));
            }
        };

        self.write_meta().size = written;
        log::debug!("Wrote {} bytes to {}", written, path.display());
        Ok(written)
    }

    /// Copy the current content of the file to `writer`.
    ///
    /// Exactly the on-disk length at open time is copied; a shorter copy is an
    /// `UnexpectedEof` I/O error.
    pub fn read_into(&self, writer: &mut dyn Write) -> Result<u64> {
        let path = self.path();
        log::debug!("Reading {}...", path.display());

        let file = File::open(&path).map_err(|e| Error::io_or_not_found(&path, e))?;
        let len = file.metadata().map_err(|e| Error::io(&path, e))?.len();
        let copied = io::copy(&mut file.take(len), writer).map_err(|e| Error::io(&path, e))?;
        if copied != len {
            return Err(Error::io(
                &path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("copied {} of {} bytes", copied, len),
                ),
            ));
        }
        Ok(copied)
    }

    /// Plain map view: `name`, `contentType`, `size`, and `path` rendered
    /// according to `form`.
    pub fn to_map(&self, form: PathForm) -> Value {
        let meta = self.read_meta();
        let path = match form {
            PathForm::Full => self.path().display().to_string(),
            PathForm::Compact => self.id.clone(),
        };

        let mut map = BTreeMap::new();
        map.insert(KEY_NAME.to_string(), Value::from(meta.name.as_str()));
        map.insert(
            KEY_CONTENT_TYPE.to_string(),
            Value::from(meta.content_type.as_str()),
        );
        map.insert(KEY_SIZE.to_string(), Value::from(meta.size));
        map.insert(KEY_PATH.to_string(), Value::String(path));
        Value::Map(map)
    }

    /// Whether `candidate` has the descriptor map shape.
    ///
    /// The key set must be exactly `name`, `contentType`, `size`, `path`, with
    /// string, string, non-negative whole number, and string values, and the
    /// path must end in a usable file name.
    pub fn is_file_info(candidate: &Value) -> bool {
        parse_shape(candidate).is_some()
    }

    /// Rehydrate a descriptor from its map shape, binding it to `base_dir`.
    ///
    /// Only the final component of `path` is kept, so both full and compact
    /// maps resolve to `<base_dir>/<id>`. This is the only place that
    /// recognises a descriptor by its shape.
    pub fn from_map(base_dir: impl Into<PathBuf>, candidate: &Value) -> Option<FileInfo> {
        let (meta, id) = parse_shape(candidate)?;
        Some(FileInfo {
            base_dir: base_dir.into(),
            id,
            meta: RwLock::new(meta),
        })
    }

    fn read_meta(&self) -> RwLockReadGuard<'_, FileMeta> {
        // Metadata is replaced field by field; a panicking writer cannot leave it torn.
        self.meta.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_meta(&self) -> RwLockWriteGuard<'_, FileMeta> {
        self.meta.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_shape(candidate: &Value) -> Option<(FileMeta, String)> {
    let map = candidate.as_map()?;
    if map.len() != 4 {
        return None;
    }

    let name = map.get(KEY_NAME)?.as_str()?;
    let content_type = map.get(KEY_CONTENT_TYPE)?.as_str()?;
    let size = parse_size(map.get(KEY_SIZE)?)?;
    let id = Path::new(map.get(KEY_PATH)?.as_str()?)
        .file_name()?
        .to_str()?
        .to_string();

    Some((
        FileMeta {
            name: name.to_string(),
            content_type: content_type.to_string(),
            size,
        },
        id,
    ))
}

/// Sizes persisted by JSON encoders that only know doubles arrive as floats.
fn parse_size(value: &Value) -> Option<u64> {
    match value {
        Value::Integer(i) => u64::try_from(*i).ok(),
        Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64 => {
            Some(*f as u64)
        }
        _ => None,
    }
}

impl PartialEq for FileInfo {
    fn eq(&self, other: &Self) -> bool {
        self.base_dir == other.base_dir && self.id == other.id && self.meta() == other.meta()
    }
}

impl Serialize for FileInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map(PathForm::Full).serialize(serializer)
    }
}
