//! Response normalization
//!
//! Turns raw API responses into [`Entity`] values. Responses may wrap their
//! payload in `{"data": ...}` envelopes at any depth; records are recognised
//! by their `object` field.
//!
//! A mapping is an envelope when it has a `data` key and no `object` marker.
//! Envelopes are unwrapped everywhere: in mapping values and in list elements.

use serde_json::{Map, Value};

use super::constants::{DATA_KEY, OBJECT_MARKER};
use super::entity::Entity;
use super::models::Pagination;
use super::page::Page;

/// What a response payload turned out to contain
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Single(Entity),
    Collection(Vec<Entity>),
}

impl Resource {
    pub fn into_entities(self) -> Vec<Entity> {
        match self {
            Self::Single(entity) => vec![entity],
            Self::Collection(entities) => entities,
        }
    }
}

fn is_record(map: &Map<String, Value>) -> bool {
    map.contains_key(OBJECT_MARKER)
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    map.contains_key(DATA_KEY) && !is_record(map)
}

/// Replace `value` by its `data` payload for as long as it is an envelope
fn strip_envelopes(mut value: Value) -> Value {
    loop {
        match value {
            Value::Object(mut map) if is_envelope(&map) => {
                value = map.remove(DATA_KEY).unwrap_or(Value::Null);
            }
            other => return other,
        }
    }
}

fn unwrap_value(value: Value) -> Value {
    match strip_envelopes(value) {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, unwrap_value(val)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_value).collect()),
        scalar => scalar,
    }
}

/// Remove every envelope from `raw`.
///
/// Returns `None` when the payload (after the outer envelopes) is not a
/// mapping or a list. Applying this to its own output is a no-op.
pub fn unwrap_envelopes(raw: &Value) -> Option<Value> {
    match strip_envelopes(raw.clone()) {
        payload @ (Value::Object(_) | Value::Array(_)) => Some(unwrap_value(payload)),
        _ => None,
    }
}

/// Decide whether an unwrapped payload is one record, a list of records, or
/// neither. Unrecognised payloads yield `None` without error.
pub fn classify(unwrapped: Value, endpoint: &str) -> Option<Resource> {
    match unwrapped {
        Value::Array(items) => {
            let first_is_record = matches!(items.first(), Some(Value::Object(map)) if is_record(map));
            if !first_is_record {
                return None;
            }

            let entities = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(attributes) => Some(Entity::new(attributes, endpoint)),
                    _ => None,
                })
                .collect();
            Some(Resource::Collection(entities))
        }
        Value::Object(map) if is_record(&map) => Some(Resource::Single(Entity::new(map, endpoint))),
        _ => None,
    }
}

/// Unwrap and classify in one step
pub fn from_data(raw: &Value, endpoint: &str) -> Option<Resource> {
    unwrap_envelopes(raw).and_then(|unwrapped| classify(unwrapped, endpoint))
}

/// `raw.meta.pagination`, when present and well-formed
pub fn extract_pagination(raw: &Value) -> Option<Pagination> {
    let pagination = raw.get("meta")?.get("pagination")?;
    serde_json::from_value(pagination.clone()).ok()
}

/// Normalize a list response into a [`Page`]
pub fn to_page(raw: &Value, endpoint: &str) -> Page {
    let items = from_data(raw, endpoint)
        .map(Resource::into_entities)
        .unwrap_or_default();
    Page::new(items, extract_pagination(raw))
}
