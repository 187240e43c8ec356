//! The parsed `found_fields` / `missing_fields` reply.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::llm_client::strip_json_fences;

/// category → (field → extracted value).
pub type FoundFields = BTreeMap<String, BTreeMap<String, String>>;

/// category → missing field names, in the order the service listed them.
///
/// Serialized as a plain JSON object; entry order survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingFields(Vec<(String, Vec<String>)>);

impl MissingFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(c, f)| (c.as_str(), f.as_slice()))
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, f)| f.as_slice())
    }

    pub fn contains(&self, category: &str, field: &str) -> bool {
        self.get(category)
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    }

    /// Entry for `category`, appended at the end if it is new.
    pub fn ensure_category(&mut self, category: &str) -> &mut Vec<String> {
        let idx = match self.0.iter().position(|(c, _)| c == category) {
            Some(idx) => idx,
            None => {
                self.0.push((category.to_string(), Vec::new()));
                self.0.len() - 1
            }
        };
        &mut self.0[idx].1
    }

    /// Appends `field` under `category` unless already listed.
    pub fn push(&mut self, category: &str, field: &str) {
        let fields = self.ensure_category(category);
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    pub fn field_count(&self) -> usize {
        self.0.iter().map(|(_, f)| f.len()).sum()
    }

    /// True when no category lists any field.
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

impl<C, F> FromIterator<(C, Vec<F>)> for MissingFields
where
    C: Into<String>,
    F: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, Vec<F>)>>(iter: I) -> Self {
        let mut missing = MissingFields::new();
        for (category, fields) in iter {
            let category: String = category.into();
            missing.ensure_category(&category);
            for field in fields {
                let field: String = field.into();
                missing.push(&category, &field);
            }
        }
        missing
    }
}

impl Serialize for MissingFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, fields) in &self.0 {
            map.serialize_entry(category, fields)?;
        }
        map.end()
    }
}

struct MissingFieldsVisitor;

impl<'de> Visitor<'de> for MissingFieldsVisitor {
    type Value = MissingFields;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of category names to lists of field names")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut missing = MissingFields::new();
        while let Some((category, fields)) = access.next_entry::<String, Value>()? {
            let fields = category_fields(fields).map_err(de::Error::custom)?;
            missing.ensure_category(&category);
            for field in fields {
                missing.push(&category, &field);
            }
        }
        Ok(missing)
    }
}

impl<'de> Deserialize<'de> for MissingFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MissingFieldsVisitor)
    }
}

/// Full structured output of one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(deserialize_with = "deserialize_found")]
    pub found_fields: FoundFields,
    pub missing_fields: MissingFields,
}

impl ExtractionResult {
    /// Parses a raw completion reply. Both top-level keys are required.
    pub fn from_reply(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_json_fences(raw))
    }

    pub fn found_value(&self, category: &str, field: &str) -> Option<&str> {
        self.found_fields
            .get(category)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn found_count(&self) -> usize {
        self.found_fields.values().map(BTreeMap::len).sum()
    }
}

/// A category's missing-field list. `null`, `""` and `[]` all mean none.
fn category_fields(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("expected a field name, found {other}")),
            })
            .collect(),
        value if is_blank(&value) => Ok(Vec::new()),
        other => Err(format!("expected a list of field names, found {other}")),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Accepts any JSON scalar or list as a field value; null means "not found".
/// A category of `null`, `""` or `[]` contributes no fields.
fn deserialize_found<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FoundFields, D::Error> {
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    let mut found = FoundFields::new();
    for (category, fields) in raw {
        let fields = match fields {
            Value::Object(map) => map,
            value if is_blank(&value) => continue,
            other => {
                return Err(de::Error::custom(format!(
                    "expected a map of field values for {category}, found {other}"
                )))
            }
        };
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .filter_map(|(field, value)| value_text(value).map(|text| (field, text)))
            .collect();
        found.insert(category, fields);
    }
    Ok(found)
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(value_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}
