/* 📖 # Why a dedicated configuration document type?

Module configuration is a hierarchical mapping of string keys to scalars, sequences
or nested mappings. Everything the admin layer derives (routes, REST controllers,
HAL metadata, db-connected sections) lives in one such document per module.

Keys routinely contain characters that other tools treat as separators: resource
classes carry backslashes, route names carry dots. Paths are therefore passed as
slices of segments, never parsed from a single dotted string.
*/

use serde_json::{Map, Value};

use restadmin_base::{RestAdminError, RestAdminResult};

/// A hierarchical module configuration document.
///
/// The root is always a mapping. Maps are sorted by key, which makes
/// serialization deterministic and read→write round-trips stable.
///
/// # Examples
///
/// ```
/// use restadmin_engine::ConfigDocument;
/// use serde_json::json;
///
/// let mut doc = ConfigDocument::new();
/// doc.put(&["zf-api-first", "db-connected", "Foo\\FooResource"], json!({"table_name": "foo"}));
/// assert_eq!(
///     doc.get(&["zf-api-first", "db-connected", "Foo\\FooResource", "table_name"]),
///     Some(&json!("foo"))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed value; the value must be a mapping (or null for an empty file).
    pub fn from_value(value: Value) -> RestAdminResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self::new()),
            other => Err(Box::new(RestAdminError::validation(format!(
                "Configuration root must be a mapping, found {}",
                value_kind(&other)
            )))),
        }
    }

    /// The root mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consume the document into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Look up the value at `path`. An empty path is not addressable.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for segment in parents {
            current = current.get(*segment)?.as_object()?;
        }
        current.get(*last)
    }

    /// Look up a mapping at `path`; `None` if absent or not a mapping.
    pub fn get_map(&self, path: &[&str]) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    /// Look up a string at `path`.
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Returns true if a value exists at `path`.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// Store `value` at `path`, replacing whatever was there.
    ///
    /// Missing intermediate mappings are created; intermediate values that are
    /// not mappings are replaced by mappings.
    pub fn put(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let parent = Self::ensure_map(&mut self.root, parents);
        parent.insert((*last).to_string(), value);
    }

    /// Deep-merge `value` into the value at `path`.
    ///
    /// Mappings are merged key by key, recursively. Sequences and scalars in
    /// `value` replace the existing ones.
    pub fn merge(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            if let Value::Object(overlay) = value {
                merge_maps(&mut self.root, overlay);
            }
            return;
        };
        let parent = Self::ensure_map(&mut self.root, parents);
        match parent.get_mut(*last) {
            Some(existing) => merge_values(existing, value),
            None => {
                parent.insert((*last).to_string(), value);
            }
        }
    }

    /// Remove and return the value at `path`. Absent paths are a no-op.
    pub fn remove(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &mut self.root;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    fn ensure_map<'a>(root: &'a mut Map<String, Value>, path: &[&str]) -> &'a mut Map<String, Value> {
        let mut current = root;
        for segment in path {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just replaced by a mapping"),
            };
        }
        current
    }
}

fn merge_values(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => merge_maps(target, overlay),
        (target, overlay) => *target = overlay,
    }
}

fn merge_maps(target: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match target.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Human-readable name of a JSON value's type, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECTION: [&str; 3] = ["zf-api-first", "db-connected", "BarConf\\Rest\\Barbaz\\BarbazResource"];

    #[test]
    fn test_put_creates_intermediate_maps() {
        let mut doc = ConfigDocument::new();
        doc.put(&SECTION, json!({"table_name": "barbaz"}));

        assert!(doc.contains(&["zf-api-first", "db-connected"]));
        assert_eq!(
            doc.get(&["zf-api-first", "db-connected", "BarConf\\Rest\\Barbaz\\BarbazResource", "table_name"]),
            Some(&json!("barbaz"))
        );
    }

    #[test]
    fn test_put_replaces_scalar_intermediate() {
        let mut doc = ConfigDocument::from_value(json!({"zf-api-first": "legacy"})).unwrap();
        doc.put(&SECTION, json!({}));
        assert!(doc.get_map(&SECTION).is_some());
    }

    #[test]
    fn test_keys_with_dots_are_single_segments() {
        let mut doc = ConfigDocument::new();
        doc.put(&["router", "routes", "bar-conf.rest.barbaz"], json!({"type": "Segment"}));
        assert_eq!(
            doc.get_str(&["router", "routes", "bar-conf.rest.barbaz", "type"]),
            Some("Segment")
        );
        assert!(doc.get(&["router", "routes", "bar-conf"]).is_none());
    }

    #[test]
    fn test_merge_overlays_nested_maps() {
        let mut doc = ConfigDocument::new();
        doc.put(
            &SECTION,
            json!({"table_name": "barbaz", "hydrator_name": "ObjectProperty", "resource_http_methods": ["GET", "PATCH"]}),
        );
        doc.merge(
            &SECTION,
            json!({"hydrator_name": "ClassMethods", "resource_http_methods": ["GET"]}),
        );

        assert_eq!(
            doc.get(&SECTION),
            Some(&json!({
                "table_name": "barbaz",
                "hydrator_name": "ClassMethods",
                "resource_http_methods": ["GET"]
            }))
        );
    }

    #[test]
    fn test_merge_at_root() {
        let mut doc = ConfigDocument::from_value(json!({"a": {"x": 1}})).unwrap();
        doc.merge(&[], json!({"a": {"y": 2}, "b": true}));
        assert_eq!(doc.into_value(), json!({"a": {"x": 1, "y": 2}, "b": true}));
    }

    #[test]
    fn test_remove_leaves_siblings() {
        let mut doc = ConfigDocument::new();
        doc.put(&SECTION, json!({"table_name": "barbaz"}));
        doc.put(&["zf-api-first", "db-connected", "BarConf\\Rest\\Foo\\FooResource"], json!({"table_name": "foo"}));

        let removed = doc.remove(&SECTION);
        assert_eq!(removed, Some(json!({"table_name": "barbaz"})));
        assert!(!doc.contains(&SECTION));
        assert!(doc.contains(&["zf-api-first", "db-connected", "BarConf\\Rest\\Foo\\FooResource"]));
        assert_eq!(doc.remove(&SECTION), None);
    }

    #[test]
    fn test_from_value_rejects_non_mapping() {
        let err = ConfigDocument::from_value(json!(["a"])).unwrap_err();
        assert!(err.is_validation());
        assert!(ConfigDocument::from_value(Value::Null).unwrap().as_map().is_empty());
    }
}
