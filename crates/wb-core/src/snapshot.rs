//! Persisted board format.
//!
//! A snapshot is a JSON object:
//!
//! ```json
//! { "nodes": [...], "connections": [...], "backgroundFrames": [...],
//!   "scale": 1, "panX": 0, "panY": 0, "showGrid": true, "backgroundMode": "dots" }
//! ```
//!
//! Decoding is tolerant: a missing or malformed field falls back to its
//! default, and a malformed entry in a list is dropped on its own. Only a
//! document that is not JSON at all, or whose root is not an object, is an
//! error; the caller then falls back to an empty board. The same shape is
//! available as MessagePack for compact storage.

use crate::error::SnapshotError;
use crate::model::{BackgroundFrame, BoardState, Connection, Node, ViewSettings};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedBoard<'a> {
    nodes: &'a [Node],
    connections: &'a [Connection],
    background_frames: &'a [BackgroundFrame],
    #[serde(flatten)]
    view: &'a ViewSettings,
}

impl<'a> From<&'a BoardState> for PersistedBoard<'a> {
    fn from(state: &'a BoardState) -> Self {
        Self {
            nodes: &state.nodes,
            connections: &state.connections,
            background_frames: &state.frames,
            view: &state.view,
        }
    }
}

/// Encode a board as compact JSON.
pub fn to_json(state: &BoardState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&PersistedBoard::from(state))?)
}

/// Encode a board as indented JSON.
pub fn to_json_pretty(state: &BoardState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&PersistedBoard::from(state))?)
}

/// Encode a board as MessagePack with named fields.
pub fn to_msgpack(state: &BoardState) -> Result<Vec<u8>, SnapshotError> {
    Ok(rmp_serde::to_vec_named(&PersistedBoard::from(state))?)
}

/// Decode a JSON snapshot, repairing per field.
pub fn from_json(text: &str) -> Result<BoardState, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(value)
}

/// Decode a MessagePack snapshot, repairing per field.
pub fn from_msgpack(bytes: &[u8]) -> Result<BoardState, SnapshotError> {
    let value: Value = rmp_serde::from_slice(bytes)?;
    from_value(value)
}

/// Decode, or fall back to an empty board with a warning.
pub fn from_json_or_default(text: &str) -> BoardState {
    from_json(text).unwrap_or_else(|err| {
        log::warn!("discarding unreadable board snapshot: {err}");
        BoardState::default()
    })
}

/// Decode an already-parsed JSON value.
pub fn from_value(value: Value) -> Result<BoardState, SnapshotError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return Err(SnapshotError::NotAnObject(value_kind(&other))),
    };

    let nodes = decode_list::<Node>(map.remove("nodes"), "nodes");
    let connections = decode_list::<Connection>(map.remove("connections"), "connections");
    let frames = decode_list::<BackgroundFrame>(map.remove("backgroundFrames"), "backgroundFrames");
    let view = decode_view(map);

    Ok(BoardState {
        nodes,
        connections,
        frames,
        view,
    })
}

fn decode_list<T: DeserializeOwned>(value: Option<Value>, field: &str) -> Vec<T> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            log::warn!("`{field}` is {}, expected an array", value_kind(&other));
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(err) => {
                log::warn!("dropping malformed `{field}[{i}]`: {err}");
                None
            }
        })
        .collect()
}

fn decode_view(map: Map<String, Value>) -> ViewSettings {
    if let Ok(view) = serde_json::from_value::<ViewSettings>(Value::Object(map.clone())) {
        return view;
    }

    let mut view = ViewSettings::default();
    if let Some(v) = field(&map, "scale") {
        view.scale = v;
    }
    if let Some(v) = field(&map, "panX") {
        view.pan_x = v;
    }
    if let Some(v) = field(&map, "panY") {
        view.pan_y = v;
    }
    if let Some(v) = field(&map, "showGrid") {
        view.show_grid = v;
    }
    if let Some(v) = field(&map, "backgroundMode") {
        view.background_mode = v;
    }
    if let Some(v) = field(&map, "backgroundColor") {
        view.background_color = v;
    }
    if let Some(v) = field(&map, "backgroundImage") {
        view.background_image = v;
    }
    view
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let raw = map.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            log::warn!("ignoring malformed `{key}`: {err}");
            None
        }
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
