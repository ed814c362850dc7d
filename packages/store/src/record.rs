//! The Record type - one submission's fields.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use formstore_core::{Error, FieldPath, Result, Value};
use formstore_files::{FileInfo, PathForm, KEY_PATH};

use crate::field::{Field, Fields};

/// The fields of one form submission.
///
/// Field kinds are not fixed: a name holding a scalar may hold a file after
/// the next merge, and the other way round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Fields,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from raw values, e.g. loaded from external persistence.
    ///
    /// File-shaped maps stay scalars until [`Record::make_file_infos`] runs.
    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            fields: values
                .into_iter()
                .map(|(k, v)| (k, Field::Scalar(v)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    /// Iterate over file fields only.
    pub fn files(&self) -> impl Iterator<Item = (&String, &Arc<FileInfo>)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_file().map(|info| (name, info)))
    }

    /// The field stored under exactly `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// The descriptor stored under `name`, if that field is a file.
    pub fn file(&self, name: &str) -> Option<&Arc<FileInfo>> {
        self.fields.get(name).and_then(Field::as_file)
    }

    pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>) -> Option<Field> {
        self.fields.insert(name.into(), field.into())
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Overwrite or insert every field in `delta`. Fields not in `delta` are
    /// untouched; nested maps are replaced whole, never merged.
    pub fn merge_with(&mut self, delta: impl IntoIterator<Item = (String, Field)>) {
        self.fields.extend(delta);
    }

    /// Resolve a path.
    ///
    /// The first segment selects a field. A file field with no further
    /// segments resolves to its descriptor; further segments descend into
    /// nested scalars or into the file's full descriptor map. A missing
    /// segment anywhere yields `None`.
    pub fn get(&self, path: &FieldPath) -> Option<Field> {
        let field = self.fields.get(path.head()?)?;
        let rest = path.tail();
        if rest.is_empty() {
            return Some(field.clone());
        }

        match field {
            Field::Scalar(value) => value.get(&rest).cloned().map(Field::Scalar),
            Field::File(info) => info
                .to_map(PathForm::Full)
                .get(&rest)
                .cloned()
                .map(Field::Scalar),
        }
    }

    /// Remove a field, or a member nested inside a scalar field.
    ///
    /// Files cannot be partially removed; a nested path under a file field
    /// yields `None` and changes nothing.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Field> {
        let head = path.head()?;
        let rest = path.tail();
        if rest.is_empty() {
            return self.fields.remove(head);
        }

        match self.fields.get_mut(head)? {
            Field::Scalar(value) => value.remove(&rest).map(Field::Scalar),
            Field::File(_) => None,
        }
    }

    /// Set a field, or a member nested inside a scalar field.
    ///
    /// A missing field is created as a map when the path goes deeper. File
    /// fields can only be replaced whole.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        let head = path
            .head()
            .ok_or_else(|| Error::invalid_argument("empty field path"))?;
        let rest = path.tail();
        if rest.is_empty() {
            self.fields.insert(head.to_string(), Field::Scalar(value));
            return Ok(());
        }

        match self
            .fields
            .entry(head.to_string())
            .or_insert_with(|| Field::Scalar(Value::map()))
        {
            Field::Scalar(current) => current.set(&rest, value),
            Field::File(_) => Err(Error::invalid_argument(format!(
                "cannot set '{}' inside file field '{}'",
                rest, head
            ))),
        }
    }

    /// The whole record as one map value, files rendered per `form`.
    pub fn to_value(&self, form: PathForm) -> Value {
        Value::Map(
            self.fields
                .iter()
                .map(|(name, field)| (name.clone(), field.to_value(form)))
                .collect(),
        )
    }

    /// Replace every top-level file-shaped scalar map with a live descriptor
    /// bound to `base_dir`.
    ///
    /// Returns how many fields were converted. Running it again converts
    /// nothing new but is wasted work; the store only runs it once.
    pub fn make_file_infos(&mut self, base_dir: &Path) -> usize {
        let mut converted = 0;
        for (name, field) in self.fields.iter_mut() {
            let Field::Scalar(value) = field else {
                continue;
            };
            match FileInfo::from_map(base_dir, value) {
                Some(info) => {
                    *field = Field::File(Arc::new(info));
                    converted += 1;
                }
                None => {
                    if value.as_map().is_some_and(|map| map.contains_key(KEY_PATH)) {
                        log::warn!(
                            "Field '{}' has a path but is not a file descriptor; kept as data",
                            name
                        );
                    }
                }
            }
        }
        converted
    }
}

impl FromIterator<(String, Field)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fields;
    use formstore_files::FileMeta;

    fn file_shape(id: &str) -> Value {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("scan.png"));
        map.insert("contentType".to_string(), Value::from("image/png"));
        map.insert("size".to_string(), Value::from(2048));
        map.insert("path".to_string(), Value::from(id));
        Value::Map(map)
    }

    #[test]
    fn merge_overwrites_and_keeps_others() {
        let mut record = Record::from(fields([("name", "Alice"), ("city", "Zug")]));
        record.merge_with(fields([("city", Value::from("Bern")), ("age", Value::from(30))]));

        assert_eq!(record.get(&"name".into()), Some(Field::from("Alice")));
        assert_eq!(record.get(&"city".into()), Some(Field::from("Bern")));
        assert_eq!(record.get(&"age".into()), Some(Field::from(30i64)));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn merge_replaces_nested_maps_whole() {
        let mut address = Value::map();
        address.set(&"city".into(), Value::from("Zug")).unwrap();
        address.set(&"zip".into(), Value::from("6300")).unwrap();
        let mut record = Record::from(fields([("address", address)]));

        let mut partial = Value::map();
        partial.set(&"city".into(), Value::from("Bern")).unwrap();
        record.merge_with(fields([("address", partial)]));

        assert_eq!(record.get(&"address.city".into()), Some(Field::from("Bern")));
        assert_eq!(record.get(&"address.zip".into()), None);
    }

    #[test]
    fn merge_can_change_field_kind() {
        let info = Arc::new(FileInfo::new("/srv", FileMeta::new("a.pdf", "application/pdf")));
        let mut record = Record::from(fields([("doc", "pending")]));

        record.merge_with(fields([("doc", Arc::clone(&info))]));
        assert!(record.file("doc").is_some());

        record.merge_with(fields([("doc", "withdrawn")]));
        assert!(record.file("doc").is_none());
        assert_eq!(record.get(&"doc".into()), Some(Field::from("withdrawn")));
    }

    #[test]
    fn get_nested_and_missing() {
        let mut scores = Value::array();
        scores.set(&"0".into(), Value::from(90)).unwrap();
        let record = Record::from(fields([("scores", scores)]));

        assert_eq!(record.get(&"scores.0".into()), Some(Field::from(90i64)));
        assert_eq!(record.get(&"scores.1".into()), None);
        assert_eq!(record.get(&"missing.deep".into()), None);
        assert_eq!(record.get(&FieldPath::default()), None);
    }

    #[test]
    fn get_file_and_its_members() {
        let info = FileInfo::new("/srv", FileMeta::new("a.pdf", "application/pdf"));
        let path = info.path().display().to_string();
        let record = Record::from(fields([("doc", info)]));

        assert!(record.get(&"doc".into()).unwrap().is_file());
        assert_eq!(record.get(&"doc.name".into()), Some(Field::from("a.pdf")));
        assert_eq!(record.get(&"doc.path".into()), Some(Field::from(path)));
        assert_eq!(record.get(&"doc.owner".into()), None);
    }

    #[test]
    fn remove_partial() {
        let mut address = Value::map();
        address.set(&"city".into(), Value::from("Zug")).unwrap();
        address.set(&"zip".into(), Value::from("6300")).unwrap();
        let info = FileInfo::new("/srv", FileMeta::new("a.pdf", "application/pdf"));
        let mut record = Record::from(fields([
            ("address", Field::from(address)),
            ("doc", Field::from(info)),
        ]));

        assert_eq!(record.remove(&"address.zip".into()), Some(Field::from("6300")));
        assert_eq!(record.get(&"address.city".into()), Some(Field::from("Zug")));

        assert_eq!(record.remove(&"doc.name".into()), None);
        assert!(record.file("doc").is_some());

        assert!(record.remove(&"doc".into()).unwrap().is_file());
        assert!(!record.contains("doc"));
        assert_eq!(record.remove(&"doc".into()), None);
    }

    #[test]
    fn set_nested_and_whole() {
        let info = FileInfo::new("/srv", FileMeta::new("a.pdf", "application/pdf"));
        let mut record = Record::from(fields([("doc", Field::from(info))]));

        record.set(&"address.city".into(), Value::from("Zug")).unwrap();
        record.set(&"name".into(), Value::from("Alice")).unwrap();
        assert_eq!(record.get(&"address.city".into()), Some(Field::from("Zug")));
        assert_eq!(record.get(&"name".into()), Some(Field::from("Alice")));

        let err = record.set(&"doc.name".into(), Value::from("b.pdf")).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(record.file("doc").unwrap().name(), "a.pdf");

        record.set(&"name.first".into(), Value::from("A")).unwrap_err();
        assert!(record.set(&FieldPath::default(), Value::Null).is_err());
    }

    #[test]
    fn to_value_renders_files_per_form() {
        let info = FileInfo::new("/srv", FileMeta::new("a.pdf", "application/pdf"));
        let id = info.id().to_string();
        let record = Record::from(fields([("doc", Field::from(info)), ("n", Field::from(1i64))]));

        let value = record.to_value(PathForm::Compact);
        assert_eq!(value.get(&"doc.path".into()), Some(&Value::from(id)));
        assert_eq!(value.get(&"n".into()), Some(&Value::from(1)));
    }

    #[test]
    fn make_file_infos_converts_shapes_only() {
        let mut values = BTreeMap::new();
        values.insert("photo".to_string(), file_shape("/old/base/abc-123"));
        values.insert("name".to_string(), Value::from("Alice"));
        let mut not_a_file = file_shape("xyz");
        not_a_file.set(&"extra".into(), Value::from(1)).unwrap();
        values.insert("almost".to_string(), not_a_file.clone());
        let mut record = Record::from_values(values);

        assert_eq!(record.make_file_infos(Path::new("/new/base")), 1);

        let photo = record.file("photo").unwrap();
        assert_eq!(photo.path(), Path::new("/new/base/abc-123"));
        assert_eq!(photo.size(), 2048);
        assert_eq!(record.get(&"name".into()), Some(Field::from("Alice")));
        assert_eq!(record.get(&"almost".into()), Some(Field::Scalar(not_a_file)));

        assert_eq!(record.make_file_infos(Path::new("/new/base")), 0);
        assert_eq!(record.files().count(), 1);
    }
}
