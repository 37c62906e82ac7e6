//! Hypermedia Collections
//!
//! A collection is encoded following the rules of a HAL `_links` object:
//! a relation with a single entry is written as the naked object, a
//! relation with several entries as an array, and a relation with no
//! entries is left out. Decoding is tolerant and accepts either shape for
//! any relation, normalizing to the list form.

use std::collections::BTreeMap;

use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{HalError, Result};

/// Scalar value carried by a link beyond its well-known properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        ExtraValue::String(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        ExtraValue::String(value)
    }
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        ExtraValue::Bool(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        ExtraValue::Number(value.into())
    }
}

/// A single entry of a collection relation.
///
/// `href` is always written. A decoded entry without one carries an empty
/// `href`, which consumers treat as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, ExtraValue>,
}

const RESERVED_PROPERTIES: [&str; 3] = ["href", "guid", "name"];

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach an extra property. Keys that name a well-known property are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<ExtraValue>) -> Self {
        let key = key.into();
        if !RESERVED_PROPERTIES.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Read a decoded entry. Well-known properties that are not strings read
    /// as absent and nested extra values are dropped, so one odd entry never
    /// spoils the whole collection.
    fn from_json_object(raw: Map<String, Value>) -> Self {
        let mut link = Link::default();

        for (key, value) in raw {
            if RESERVED_PROPERTIES.contains(&key.as_str()) {
                let Value::String(text) = value else {
                    continue;
                };
                match key.as_str() {
                    "href" => link.href = text,
                    "guid" => link.guid = Some(text),
                    _ => link.name = Some(text),
                }
                continue;
            }

            let extra = match value {
                Value::Null => ExtraValue::Null,
                Value::Bool(b) => ExtraValue::Bool(b),
                Value::Number(n) => ExtraValue::Number(n),
                Value::String(s) => ExtraValue::String(s),
                Value::Array(_) | Value::Object(_) => continue,
            };
            link.extra.insert(key, extra);
        }

        link
    }

    /// The `href`, or `None` when the entry did not carry one
    pub fn href(&self) -> Option<&str> {
        if self.href.is_empty() {
            None
        } else {
            Some(&self.href)
        }
    }
}

/// Build a minimal link holding only an `href`
pub fn create_link(href: impl Into<String>) -> Link {
    Link::new(href)
}

/// Relation name to ordered entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    relations: BTreeMap<String, Vec<Link>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries of a relation
    pub fn insert(&mut self, relation: impl Into<String>, links: Vec<Link>) {
        self.relations.insert(relation.into(), links);
    }

    /// Append an entry to a relation
    pub fn push(&mut self, relation: impl Into<String>, link: Link) {
        self.relations.entry(relation.into()).or_default().push(link);
    }

    pub fn with(mut self, relation: impl Into<String>, link: Link) -> Self {
        self.push(relation, link);
        self
    }

    /// Entries of a relation; empty when the relation is absent
    pub fn get(&self, relation: &str) -> &[Link] {
        self.relations
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn first(&self, relation: &str) -> Option<&Link> {
        self.get(relation).first()
    }

    /// Whether the relation key is present, even with zero entries
    pub fn contains_relation(&self, relation: &str) -> bool {
        self.relations.contains_key(relation)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &[Link])> {
        self.relations
            .iter()
            .map(|(relation, links)| (relation.as_str(), links.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let raw: Map<String, Value> = serde_json::from_slice(data)?;
        Self::from_json_map(raw)
    }

    /// Decode an already parsed `_links` value. `null` reads as empty.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(raw) => Self::from_json_map(raw),
            _ => Err(HalError::InvalidCollectionShape {
                relation: "_links".to_string(),
            }),
        }
    }

    fn from_json_map(raw: Map<String, Value>) -> Result<Self> {
        let mut relations = BTreeMap::new();

        for (relation, value) in raw {
            let links = match value {
                // An explicit null keeps the relation with no entries
                Value::Null => Vec::new(),
                Value::Object(entry) => vec![Link::from_json_object(entry)],
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(entry) => Ok(Link::from_json_object(entry)),
                        _ => Err(HalError::InvalidCollectionShape {
                            relation: relation.clone(),
                        }),
                    })
                    .collect::<Result<Vec<Link>>>()?,
                _ => return Err(HalError::InvalidCollectionShape { relation }),
            };
            relations.insert(relation, links);
        }

        Ok(Self { relations })
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let populated = self.relations.values().filter(|links| !links.is_empty()).count();
        let mut map = serializer.serialize_map(Some(populated))?;

        for (relation, links) in &self.relations {
            match links.as_slice() {
                [] => continue,
                [single] => map.serialize_entry(relation, single)?,
                many => map.serialize_entry(relation, many)?,
            }
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_json_map(raw).map_err(de::Error::custom)
    }
}
