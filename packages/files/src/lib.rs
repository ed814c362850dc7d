//! Uploaded-file descriptors.
//!
//! A [`FileInfo`] pairs the metadata of one uploaded file (name, content type,
//! size) with a generated, immutable location under a base directory:
//!
//! ```text
//! <base_dir>/
//! └── 76ed295d-92d8-41b1-83be-7078ea9a94a2   # one upload, named by UUID v4
//! ```
//!
//! Descriptors only write and read bytes. Deleting them is left to whoever
//! manages the lifecycle of the base directory.

mod file_info;
mod meta;

pub use file_info::FileInfo;
pub use meta::{FileMeta, PathForm, KEY_CONTENT_TYPE, KEY_NAME, KEY_PATH, KEY_SIZE};
