//! JSON:API envelope types.
//!
//! Requests and responses wrap a single resource object:
//! `{"data": {"type": ..., "id": ..., "attributes": {...}, "relationships": {...}}}`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: Resource<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Resource<T> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_id"
    )]
    pub id: Option<String>,
    pub attributes: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

impl<T> Document<T> {
    /// New resource document without an id (the server assigns it).
    pub fn new(kind: &str, attributes: T) -> Self {
        Self {
            data: Resource {
                kind: kind.to_string(),
                id: None,
                attributes,
                relationships: None,
            },
        }
    }

    pub fn with_relationship(mut self, name: &str, kind: &str, id: &str) -> Self {
        let mut relationships = self
            .data
            .relationships
            .take()
            .unwrap_or_else(|| Value::Object(Default::default()));
        relationships[name] = serde_json::json!({ "data": { "type": kind, "id": id } });
        self.data.relationships = Some(relationships);
        self
    }

    /// Resource id, which every response of a create call must carry.
    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Resource ids are strings per JSON:API, but some endpoints send bare numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}
