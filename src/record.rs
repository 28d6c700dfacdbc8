//! Listing records and the loose JSON casting applied before they are stored.
//!
//! The store keeps whatever text it is given for every field. Casting only
//! normalises JSON scalars into strings; it never checks that a `level` is one
//! of the known values or that a `location` parses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status of a listed object, by convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Available,
    Inquired,
    Taken,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Available, Level::Inquired, Level::Taken];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Available => "Available",
            Level::Inquired => "Inquired",
            Level::Taken => "Taken",
        }
    }

    /// Exact, case-sensitive match on the stored text
    pub fn parse(s: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|level| level.as_str() == s)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored listing document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Record {
    /// Empty document carrying only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            level: None,
            location: None,
            images: Vec::new(),
        }
    }

    /// Known level, or None for unset or unrecognised text
    pub fn known_level(&self) -> Option<Level> {
        self.level.as_deref().and_then(Level::parse)
    }

    /// Merge a patch: only fields present in the patch change
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(level) = &patch.level {
            self.level = level.clone();
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
    }

    /// The full document as a JSON value, used as the base for client-side updates
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A body value could not be cast into the record schema
#[derive(Debug, Clone, PartialEq)]
pub struct CastError {
    pub path: String,
    pub value: String,
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cast failed for value {} at path \"{}\"", self.value, self.path)
    }
}

impl std::error::Error for CastError {}

/// Fields present in a create/update body.
///
/// Outer `None` means the key was absent. `Some(None)` means the key was
/// present with `null` and clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub level: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub images: Option<Vec<String>>,
}

impl RecordPatch {
    /// Cast an arbitrary JSON body. Unknown keys and `_id` are dropped.
    pub fn from_json(body: &Value) -> Result<Self, CastError> {
        let obj = body.as_object().ok_or_else(|| CastError {
            path: "".to_string(),
            value: body.to_string(),
        })?;

        Ok(Self {
            name: cast_text_field(obj, "name")?,
            description: cast_text_field(obj, "description")?,
            level: cast_text_field(obj, "level")?,
            location: cast_text_field(obj, "location")?,
            images: cast_images(obj)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &RecordPatch::default()
    }
}

fn cast_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn cast_text_field(obj: &Map<String, Value>, key: &str) -> Result<Option<Option<String>>, CastError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(value) => cast_scalar(value).map(|s| Some(Some(s))).ok_or_else(|| CastError {
            path: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn cast_images(obj: &Map<String, Value>) -> Result<Option<Vec<String>>, CastError> {
    match obj.get("images") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(Vec::new())),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                cast_scalar(item).ok_or_else(|| CastError {
                    path: format!("images.{}", i),
                    value: item.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(CastError {
            path: "images".to_string(),
            value: other.to_string(),
        }),
    }
}
