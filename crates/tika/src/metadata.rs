//! Recursive metadata normalization.
//!
//! The `/rmeta` endpoints answer with a JSON array holding one object per
//! document (the container first, then every embedded document in the order
//! Tika visited them). Field values arrive either as a single string or as an
//! array of strings depending on how many values Tika collected, so every
//! value is normalized to a list here. Any other shape is rejected.

use crate::{Result, TikaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata field holding the extracted text of a document in recursive
/// responses. See [`Client::parse_recursive`](crate::Client::parse_recursive).
pub const XTIKA_CONTENT: &str = "X-TIKA:content";

/// Normalized metadata of a single document: field name to ordered values.
///
/// Field order follows the server response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument(IndexMap<String, Vec<String>>);

impl MetadataDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of `field`, or `None` if the document does not carry it.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First value of `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, values: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(field.into(), values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.0
    }
}

impl From<IndexMap<String, Vec<String>>> for MetadataDocument {
    fn from(fields: IndexMap<String, Vec<String>>) -> Self {
        Self(fields)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for MetadataDocument {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Metadata for a document and all of its embedded documents, in document order.
pub type RecursiveMetadata = Vec<MetadataDocument>;

/// The value shapes a recursive metadata field may take on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Normalized list form: `Single(x)` becomes `[x]`.
    pub fn into_values(self) -> Vec<String> {
        match self {
            FieldValue::Single(value) => vec![value],
            FieldValue::Multiple(values) => values,
        }
    }
}

impl TryFrom<Value> for FieldValue {
    /// Description of the offending shape.
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(FieldValue::Single(s)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s),
                    other => Err(format!(
                        "has a {} element at index {} ({}), expected a string or a list of strings",
                        json_kind(&other),
                        i,
                        other
                    )),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(FieldValue::Multiple),
            other => Err(format!(
                "has value {} of type {}, expected a string or a list of strings",
                other,
                json_kind(&other)
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize a raw recursive metadata response body.
///
/// Fails on the first field whose value is neither a string nor a list of
/// strings; the error names the field and the index of its document.
pub fn normalize_recursive_metadata(body: &[u8]) -> Result<RecursiveMetadata> {
    let raw: Vec<IndexMap<String, Value>> = serde_json::from_slice(body).map_err(|e| {
        TikaError::decoding_with_source(
            format!("recursive metadata response is not a JSON array of objects: {}", e),
            e,
        )
    })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, fields)| normalize_document(index, fields))
        .collect()
}

fn normalize_document(index: usize, fields: IndexMap<String, Value>) -> Result<MetadataDocument> {
    let mut document = IndexMap::with_capacity(fields.len());
    for (field, value) in fields {
        let values = FieldValue::try_from(value)
            .map_err(|reason| TikaError::decoding(format!("document {}: field {:?} {}", index, field, reason)))?
            .into_values();
        document.insert(field, values);
    }
    Ok(MetadataDocument(document))
}

/// Extract the text content of every document, in document order.
///
/// Documents without an `X-TIKA:content` value are skipped rather than
/// represented by an empty string. Only the first value of a document is used.
pub fn content_of(documents: &[MetadataDocument]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| doc.first(XTIKA_CONTENT))
        .map(str::to_string)
        .collect()
}
