//! formstore: form submission records with uploaded files on local disk.
//!
//! A [`DataStore`] maps a submission id to a [`Record`]. Each record field is
//! a [`Field`]: either a scalar [`Value`] or a live [`FileInfo`] whose bytes
//! live under the store's base directory.
//!
//! The id→record map is guarded by a single reader/writer lock. Lookups and
//! exports share it; inserts, replacements, and removals take it exclusively.
//! File bytes are copied to and from disk outside the lock wherever the
//! descriptor already exists.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use formstore::{fields, DataStore, FileMeta, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = DataStore::new(dir.path());
//!
//! store.put_record("s1", fields([("name", Value::from("Alice"))])).unwrap();
//! store.put_record("s1", fields([("age", Value::from(30))])).unwrap();
//!
//! let meta = FileMeta::new("cv.pdf", "application/pdf");
//! store.put_file("s1", "cv", meta, &mut Cursor::new(b"%PDF".to_vec())).unwrap();
//!
//! let record = store.get_record("s1").unwrap().unwrap();
//! assert_eq!(record.len(), 3);
//! assert_eq!(store.get_file("s1", "cv").unwrap().size(), 4);
//! ```
//!
//! Index entries are process memory only. Rebuilding them after a restart is
//! up to the caller: load raw maps with [`DataStore::with_records`] and call
//! [`DataStore::on_load`] to turn file-shaped maps back into descriptors.

mod config;
mod data_store;
mod export;
mod field;
mod record;

pub use config::{StoreConfig, BASE_DIR_ENV};
pub use data_store::DataStore;
pub use export::{CompactExport, SplitExport};
pub use field::{fields, fields_from_json, Field, Fields};
pub use record::Record;

pub use formstore_core::{Error, FieldPath, Result, Value};
pub use formstore_files::{FileInfo, FileMeta, PathForm};
