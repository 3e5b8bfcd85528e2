//! Open-ended detail maps and the domain objects they mention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Detail map attached to use cases, scenarios, steps and objects.
///
/// A `BTreeMap` so that persisted artifacts serialize in key order.
pub type Details = BTreeMap<String, DetailValue>;

/// Identifies a domain object by `(type, name)`.
///
/// Implements `Ord` (type, then name) for deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Object type, e.g. `"page"` or `"businessObject"`.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Object name, unique within its type.
    pub name: String,
}

impl ObjectReference {
    /// Create a new object reference.
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.name)
    }
}

/// Full description of a domain object: its reference plus its own details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectDescription {
    /// Object type.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Object name.
    pub name: String,
    /// Nested details, which may mention further objects.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: Details,
}

impl ObjectDescription {
    /// Create a description without details.
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            details: Details::new(),
        }
    }

    /// Add a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: DetailValue) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// The `(type, name)` reference of this object.
    pub fn reference(&self) -> ObjectReference {
        ObjectReference::new(self.object_type.clone(), self.name.clone())
    }
}

/// One value of a detail map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DetailValue {
    /// Plain text.
    Text(String),
    /// Integer scalar.
    Integer(i64),
    /// Boolean scalar.
    Boolean(bool),
    /// Ordered list of values.
    List(Vec<DetailValue>),
    /// Reference to an object described elsewhere.
    Reference(ObjectReference),
    /// Inline description of an object.
    Object(ObjectDescription),
}

impl DetailValue {
    /// Convenience constructor for text values.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Convenience constructor for object references.
    pub fn reference(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Reference(ObjectReference::new(object_type, name))
    }
}
