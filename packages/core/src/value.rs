//! The Value type - a tree-shaped scalar field value.
//!
//! Form fields hold strings, numbers, booleans, lists, and nested maps. This
//! dynamically-typed tree represents all of them and maps directly to JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, FieldPath};

/// A tree-shaped value stored in a record field.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering (stable exports, comparison)
/// - Uses `i64` for integers, matching what JSON form posts carry in practice
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value. Distinct from "field doesn't exist".
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get a reference to a nested value by path.
    ///
    /// Returns `None` if the path doesn't exist or can't be navigated
    /// (e.g., trying to index into a string).
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = self;
        for segment in path.iter() {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::Array(arr) => {
                    let index: usize = segment.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get a mutable reference to a nested value by path.
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        let mut current = self;
        for segment in path.iter() {
            current = match current {
                Value::Map(map) => map.get_mut(segment)?,
                Value::Array(arr) => {
                    let index: usize = segment.parse().ok()?;
                    arr.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set a value at a path, creating intermediate maps as needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the path traverses through a non-container
    /// value (e.g., setting `a.b` when `a` is a string) or uses a bad index.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), Error> {
        if path.is_empty() {
            *self = value;
            return Ok(());
        }

        let (last, parents) = path
            .segments
            .split_last()
            .ok_or_else(|| Error::invalid_argument("empty path"))?;

        let mut current = self;
        for segment in parents {
            if current.is_null() {
                *current = Value::map();
            }
            current = match current {
                Value::Map(map) => map.entry(segment.clone()).or_insert_with(Value::map),
                Value::Array(arr) => {
                    let index = parse_index(segment)?;
                    arr.get_mut(index).ok_or_else(|| {
                        Error::invalid_argument(format!("array index {} out of bounds", index))
                    })?
                }
                _ => {
                    return Err(Error::invalid_argument(format!(
                        "cannot navigate through non-container at '{}'",
                        segment
                    )));
                }
            };
        }

        if current.is_null() {
            *current = Value::map();
        }
        match current {
            Value::Map(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(arr) => {
                let index = parse_index(last)?;
                if index < arr.len() {
                    arr[index] = value;
                } else if index == arr.len() {
                    arr.push(value);
                } else {
                    return Err(Error::invalid_argument(format!(
                        "array index {} out of bounds",
                        index
                    )));
                }
                Ok(())
            }
            _ => Err(Error::invalid_argument(format!(
                "cannot set child '{}' on non-container value",
                last
            ))),
        }
    }

    /// Remove a value at a path, returning it if it existed.
    ///
    /// Removing the empty path resets this value to `Null`.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        let Some((last, _)) = path.segments.split_last() else {
            return Some(std::mem::take(self));
        };

        let parent = self.get_mut(&path.slice(0, path.len() - 1))?;
        match parent {
            Value::Map(map) => map.remove(last),
            Value::Array(arr) => {
                let index: usize = last.parse().ok()?;
                (index < arr.len()).then(|| arr.remove(index))
            }
            _ => None,
        }
    }
}

fn parse_index(segment: &str) -> Result<usize, Error> {
    segment
        .parse()
        .map_err(|_| Error::invalid_argument(format!("invalid array index: {}", segment)))
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Float(v as f64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => arr.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(crate::convert::json_to_value)
    }
}
