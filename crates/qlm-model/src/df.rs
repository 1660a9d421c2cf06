//! Data-format (measurement document) types.
//!
//! The document root is [`Objects`]. Every [`Object`] may contain further objects,
//! which is the only unbounded recursion in the model. [`InfoItem`]s hold measured
//! [`Value`]s and may carry a [`MetaData`] block made of more info items.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root of a data-format document (`<Objects>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objects {
    /// Schema version; omitted from XML when empty.
    pub version: String,
    /// Top-level objects in document order.
    pub objects: Vec<Object>,
}

impl Objects {
    /// Create a document holding the given top-level objects.
    #[must_use]
    pub fn new(objects: Vec<Object>) -> Self {
        Self {
            version: String::new(),
            objects,
        }
    }

    /// Find an object by its path of identifiers, starting at the top level.
    #[must_use]
    pub fn find_object(&self, path: &[&str]) -> Option<&Object> {
        let (first, rest) = path.split_first()?;
        let top = self.objects.iter().find(|o| o.id_text() == Some(*first))?;
        if rest.is_empty() {
            Some(top)
        } else {
            top.find_object(rest)
        }
    }
}

/// A physical or logical entity (`<Object>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// Classification, e.g. `"Refrigerator Assembly Product"`.
    #[serde(rename = "type")]
    pub type_: String,
    /// UDEF classification code.
    pub udef: String,
    /// Identifier of the object.
    pub id: Option<QlmId>,
    /// Human-readable description.
    pub description: Option<Description>,
    /// Properties of this object.
    pub info_items: Vec<InfoItem>,
    /// Sub-objects.
    pub objects: Vec<Object>,
}

impl Object {
    /// Create an object with a plain identifier and nothing else.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(QlmId::new(id)),
            ..Self::default()
        }
    }

    /// The identifier text, if an identifier is present.
    #[must_use]
    pub fn id_text(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.text.as_str())
    }

    /// Look up an info item by its primary name.
    #[must_use]
    pub fn info_item(&self, name: &str) -> Option<&InfoItem> {
        self.info_items.iter().find(|item| item.name == name)
    }

    /// Find a descendant object by its path of identifiers, relative to this object.
    #[must_use]
    pub fn find_object(&self, path: &[&str]) -> Option<&Object> {
        path.iter().try_fold(self, |current, id| {
            current.objects.iter().find(|o| o.id_text() == Some(*id))
        })
    }

    /// Nesting depth of the object tree rooted here (a leaf object has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.objects.iter().map(Object::depth).max().unwrap_or(0)
    }
}

/// Identifier of an object (`<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QlmId {
    /// Identifier value.
    pub text: String,
    /// Kind of identifier.
    pub id_type: String,
    /// Kind of tag carrying the identifier (RFID, barcode, ...).
    pub tag_type: String,
    /// Start of validity.
    pub start_date: String,
    /// End of validity.
    pub end_date: String,
    /// UDEF classification code.
    pub udef: String,
}

impl QlmId {
    /// Create an identifier with no attributes.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Free-text annotation (`<description>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    /// Language tag.
    pub lang: String,
    /// UDEF classification code.
    pub udef: String,
    /// Description text.
    pub text: String,
}

impl Description {
    /// Create a description with no attributes.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A named property of an object (`<InfoItem>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoItem {
    /// UDEF classification code.
    pub udef: String,
    /// Primary name. Always written, even when empty.
    pub name: String,
    /// Human-readable description.
    pub description: Option<Description>,
    /// Alternate names, in document order.
    pub other_names: Vec<String>,
    /// Nested metadata block.
    pub meta_data: Option<MetaData>,
    /// Measured values, in stream order.
    pub values: Vec<Value>,
}

impl InfoItem {
    /// Create an info item with the given primary name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Most recent value as stored last in the list.
    #[must_use]
    pub fn latest_value(&self) -> Option<&Value> {
        self.values.last()
    }
}

/// Metadata about an info item (`<MetaData>`), itself made of info items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Metadata entries such as `unit` or `accuracy`.
    pub info_items: Vec<InfoItem>,
}

/// A single measurement sample (`<value>`).
///
/// `date_time` and `unix_time` are independent: either, both or neither may be set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    /// Sample encoded as text.
    pub text: String,
    /// XML Schema type tag such as `xs:double`.
    #[serde(rename = "type")]
    pub type_: String,
    /// ISO-8601 timestamp.
    pub date_time: String,
    /// Epoch seconds; zero means absent.
    pub unix_time: i64,
}

impl Value {
    /// Create an untyped, untimestamped value.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Resolve the sample time.
    ///
    /// `date_time` is used when it parses, either as RFC 3339 or as a zone-less
    /// ISO-8601 timestamp taken to be UTC. Otherwise a non-zero `unix_time` is used.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_date_time(&self.date_time).or_else(|| {
            if self.unix_time == 0 {
                None
            } else {
                DateTime::from_timestamp(self.unix_time, 0)
            }
        })
    }
}

fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
