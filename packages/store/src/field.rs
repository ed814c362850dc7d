//! Record field values.

use std::collections::BTreeMap;
use std::sync::Arc;

use formstore_core::convert::json_to_value;
use formstore_core::{Error, Result, Value};
use formstore_files::{FileInfo, PathForm};

/// The value held by one record field.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// Plain submitted data: strings, numbers, booleans, lists, nested maps.
    Scalar(Value),
    /// An uploaded file. Shared so callers can hold a live reference.
    File(Arc<FileInfo>),
}

/// A field-name → field map, used for merge and replace writes.
pub type Fields = BTreeMap<String, Field>;

impl Field {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Field::Scalar(value) => Some(value),
            Field::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&Arc<FileInfo>> {
        match self {
            Field::File(info) => Some(info),
            Field::Scalar(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Field::File(_))
    }

    /// Plain value view; files render as their descriptor map.
    pub fn to_value(&self, form: PathForm) -> Value {
        match self {
            Field::Scalar(value) => value.clone(),
            Field::File(info) => info.to_map(form),
        }
    }
}

impl From<Value> for Field {
    fn from(v: Value) -> Self {
        Field::Scalar(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Scalar(Value::from(v))
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Scalar(Value::from(v))
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Scalar(Value::from(v))
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Scalar(Value::from(v))
    }
}

impl From<FileInfo> for Field {
    fn from(v: FileInfo) -> Self {
        Field::File(Arc::new(v))
    }
}

impl From<Arc<FileInfo>> for Field {
    fn from(v: Arc<FileInfo>) -> Self {
        Field::File(v)
    }
}

/// Build a field map from name/value pairs.
pub fn fields<K, V, I>(pairs: I) -> Fields
where
    K: Into<String>,
    V: Into<Field>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Build a field map from a JSON object. Every member becomes a scalar.
///
/// # Errors
///
/// `InvalidArgument` if `json` is not an object.
pub fn fields_from_json(json: serde_json::Value) -> Result<Fields> {
    match json {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, Field::Scalar(json_to_value(v))))
            .collect()),
        other => Err(Error::invalid_argument(format!(
            "expected a JSON object of fields, got {}",
            other
        ))),
    }
}
