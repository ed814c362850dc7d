//! Flattened views of every record in a store.
//!
//! All three views merge the fields of every record into one map. Records
//! are visited in ascending id order, so when two records share a field name
//! the one with the greater id wins.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use formstore_core::{Result, Value};
use formstore_files::{FileInfo, PathForm};

use crate::data_store::DataStore;
use crate::field::Field;

/// Flattened data with file fields reduced to compact descriptor maps, plus
/// the absolute path of every file referenced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactExport {
    pub data: BTreeMap<String, Value>,
    /// One entry per file field across all records.
    pub files: Vec<PathBuf>,
}

/// Flattened scalar data and file descriptors, kept apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitExport {
    pub data: BTreeMap<String, Value>,
    pub files: BTreeMap<String, Arc<FileInfo>>,
}

impl DataStore {
    /// Every field of every record, with files rendered as full descriptor
    /// maps (absolute `path`).
    ///
    /// Scalar maps that have the descriptor shape but were never rehydrated
    /// are rendered the same way, bound to this store's base directory.
    ///
    /// ```text
    /// {
    ///     "key": "value",
    ///     "fileKey": {
    ///         "name": "myfile.pdf",
    ///         "contentType": "application/pdf",
    ///         "size": 123,
    ///         "path": "<base_dir>/76ed295d-92d8-41b1-83be-7078ea9a94a2"
    ///     }
    /// }
    /// ```
    pub fn export_all(&self) -> Result<BTreeMap<String, Value>> {
        let inner = self.read()?;
        let mut data = BTreeMap::new();
        for record in inner.records.values() {
            for (name, field) in record.iter() {
                let value = match field {
                    Field::File(info) => info.to_map(PathForm::Full),
                    Field::Scalar(value) => match FileInfo::from_map(self.base_dir(), value) {
                        Some(info) => info.to_map(PathForm::Full),
                        None => value.clone(),
                    },
                };
                data.insert(name.clone(), value);
            }
        }
        Ok(data)
    }

    /// Every field of every record, with files rendered as compact
    /// descriptor maps (bare id as `path`), plus the absolute file paths.
    pub fn export_all_compact(&self) -> Result<CompactExport> {
        let inner = self.read()?;
        let mut export = CompactExport::default();
        for record in inner.records.values() {
            for (name, field) in record.iter() {
                if let Field::File(info) = field {
                    export.files.push(info.path());
                }
                export
                    .data
                    .insert(name.clone(), field.to_value(PathForm::Compact));
            }
        }
        Ok(export)
    }

    /// Every field of every record, split into scalar data and descriptors.
    ///
    /// `base_uri` is accepted for callers that build download links from the
    /// descriptors; the view itself does not depend on it.
    pub fn export_all_split(&self, base_uri: &str) -> Result<SplitExport> {
        log::trace!("Split export for base URI '{}'", base_uri);
        let inner = self.read()?;
        let mut export = SplitExport::default();
        for record in inner.records.values() {
            for (name, field) in record.iter() {
                match field {
                    Field::File(info) => {
                        export.files.insert(name.clone(), Arc::clone(info));
                    }
                    Field::Scalar(value) => {
                        export.data.insert(name.clone(), value.clone());
                    }
                }
            }
        }
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fields;
    use formstore_files::FileMeta;

    fn doc(base: &str, name: &str) -> Field {
        Field::from(FileInfo::new(base, FileMeta::new(name, "application/pdf")))
    }

    #[test]
    fn empty_store_exports_nothing() {
        let store = DataStore::new("/base");
        assert!(store.export_all().unwrap().is_empty());
        assert_eq!(store.export_all_compact().unwrap(), CompactExport::default());
        assert_eq!(store.export_all_split("/api").unwrap(), SplitExport::default());
    }

    #[test]
    fn export_all_renders_files_and_raw_shapes() {
        let store = DataStore::new("/base");
        store
            .put_record(
                "s1",
                fields([("name", Field::from("Alice")), ("cv", doc("/base", "cv.pdf"))]),
            )
            .unwrap();

        let mut raw = BTreeMap::new();
        raw.insert("name".to_string(), Value::from("id.png"));
        raw.insert("contentType".to_string(), Value::from("image/png"));
        raw.insert("size".to_string(), Value::from(7));
        raw.insert("path".to_string(), Value::from("abc-123"));
        store
            .put_record("s2", fields([("passport", Value::Map(raw))]))
            .unwrap();

        let data = store.export_all().unwrap();
        assert_eq!(data["name"], Value::from("Alice"));

        let cv_path = store.get_file("s1", "cv").unwrap().path().display().to_string();
        assert_eq!(data["cv"].get(&"path".into()), Some(&Value::from(cv_path)));
        assert_eq!(
            data["passport"].get(&"path".into()),
            Some(&Value::from("/base/abc-123"))
        );
    }

    #[test]
    fn later_ids_win_on_shared_names() {
        let store = DataStore::new("/base");
        store.put_record("a", fields([("name", "first")])).unwrap();
        store.put_record("b", fields([("name", "second")])).unwrap();

        assert_eq!(store.export_all().unwrap()["name"], Value::from("second"));
    }

    #[test]
    fn compact_lists_every_file_field() {
        let store = DataStore::new("/base");
        store
            .put_record(
                "a",
                fields([("cv", doc("/base", "a.pdf")), ("age", Field::from(30i64))]),
            )
            .unwrap();
        store.put_record("b", fields([("cv", doc("/base", "b.pdf"))])).unwrap();

        let export = store.export_all_compact().unwrap();
        assert_eq!(export.files.len(), 2);

        let b_cv = store.get_file("b", "cv").unwrap();
        assert_eq!(
            export.data["cv"].get(&"path".into()),
            Some(&Value::from(b_cv.id()))
        );
        assert!(export.files.contains(&b_cv.path()));
        assert_eq!(export.data["age"], Value::from(30));
    }

    #[test]
    fn split_separates_files() {
        let store = DataStore::new("/base");
        store
            .put_record(
                "s1",
                fields([("cv", doc("/base", "cv.pdf")), ("name", Field::from("Alice"))]),
            )
            .unwrap();

        let export = store.export_all_split("https://example.invalid/api").unwrap();
        assert_eq!(export.data.len(), 1);
        assert_eq!(export.data["name"], Value::from("Alice"));
        assert_eq!(export.files.len(), 1);
        assert!(Arc::ptr_eq(
            &export.files["cv"],
            &store.get_file("s1", "cv").unwrap()
        ));
    }
}
