//! Descriptor metadata and its map shape.

use serde::{Deserialize, Serialize};

pub const KEY_NAME: &str = "name";
pub const KEY_CONTENT_TYPE: &str = "contentType";
pub const KEY_SIZE: &str = "size";
pub const KEY_PATH: &str = "path";

/// Metadata supplied with an upload.
///
/// `size` is overwritten with the number of bytes actually written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: 0,
        }
    }
}

/// How the `path` key is rendered in a descriptor map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathForm {
    /// Absolute location: `<base_dir>/<id>`.
    Full,
    /// Bare id without the base directory.
    Compact,
}
