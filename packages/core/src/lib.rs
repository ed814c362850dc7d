//! Core formstore: the semantic layer shared by descriptors and stores.
//!
//! - `Value`: parsed tree structure for scalar form fields
//! - `FieldPath`: dotted or slash-separated path into a record
//! - `Error`: the error taxonomy every formstore operation reports
//!
//! # Example
//!
//! ```rust
//! use formstore_core::{FieldPath, Value};
//!
//! let mut address = Value::map();
//! address.set(&FieldPath::parse("city"), Value::from("Zug")).unwrap();
//! assert_eq!(address.get(&FieldPath::parse("city")), Some(&Value::from("Zug")));
//! ```

pub mod convert;
mod error;
mod path;
mod value;

pub use error::{Error, Result};
pub use path::FieldPath;
pub use value::Value;
