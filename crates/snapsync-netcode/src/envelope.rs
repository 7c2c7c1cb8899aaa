//! Inbound message envelopes
//!
//! The connection delivers either a binary snapshot or a JSON text frame of
//! the form `{"type": ..., "data": ...}`. Both decode to the same `Message`,
//! so the reconciler never sees which protocol carried it.

use crate::error::{Error, Result};
use crate::wire;
use indexmap::IndexMap;
use serde::Deserialize;
use snapsync_core::{Message, MessageKind, ObjectId, ObjectKind, ObjectRecord, Position};

/// One message as delivered by the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Binary snapshot in the wire format
    Binary(Vec<u8>),
    /// JSON text envelope
    Text(String),
}

impl Inbound {
    /// Decode into a `Message`
    pub fn decode(&self) -> Result<Message> {
        match self {
            Inbound::Binary(bytes) => Ok(wire::decode(bytes)?),
            Inbound::Text(text) => parse_text(text),
        }
    }

    /// Size of the payload in bytes
    pub fn len(&self) -> usize {
        match self {
            Inbound::Binary(bytes) => bytes.len(),
            Inbound::Text(text) => text.len(),
        }
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for Inbound {
    fn from(bytes: Vec<u8>) -> Self {
        Inbound::Binary(bytes)
    }
}

impl From<String> for Inbound {
    fn from(text: String) -> Self {
        Inbound::Text(text)
    }
}

impl From<&str> for Inbound {
    fn from(text: &str) -> Self {
        Inbound::Text(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TextEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct TextPosition {
    #[serde(rename = "X", default)]
    x: f32,
    #[serde(rename = "Y", default)]
    y: f32,
}

#[derive(Debug, Default, Deserialize)]
struct TextObjectData {
    #[serde(rename = "Position", default)]
    position: TextPosition,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "Data")]
    data: Option<TextObjectData>,
}

impl TextObject {
    fn into_record(self, id: ObjectId) -> ObjectRecord {
        let kind = self
            .kind
            .as_deref()
            .map(ObjectKind::from_name)
            .unwrap_or_default();
        let position = self
            .data
            .map(|d| Position::new(d.position.x, d.position.y))
            .unwrap_or_default();
        ObjectRecord { id, kind, position }
    }
}

#[derive(Debug, Deserialize)]
struct JoinedData {
    id: u32,
    #[serde(flatten)]
    object: TextObject,
}

#[derive(Debug, Deserialize)]
struct LeftData {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateData {
    objects: IndexMap<String, TextObject>,
}

/// Parse a JSON text envelope
///
/// Objects without a `type` are characters; objects without `Data` sit at
/// the origin. Unsupported envelope types yield an `Unrecognized` message
/// with no records.
///
/// # Example
///
/// ```
/// use snapsync_core::{MessageKind, ObjectId, Position};
/// use snapsync_netcode::envelope::parse_text;
///
/// let msg = parse_text(
///     r#"{"type":"player_joined","data":{"id":3,"Data":{"Position":{"X":1.5,"Y":2}}}}"#,
/// )
/// .unwrap();
/// assert_eq!(msg.kind, MessageKind::PlayerJoined);
/// assert_eq!(msg.records[0].id, ObjectId::new(3));
/// assert_eq!(msg.records[0].position, Position::new(1.5, 2.0));
/// ```
pub fn parse_text(text: &str) -> Result<Message> {
    let envelope: TextEnvelope = serde_json::from_str(text)?;
    let kind = MessageKind::from_tag(&envelope.kind);

    let records = match kind {
        MessageKind::PlayerJoined => {
            let data: JoinedData = serde_json::from_value(envelope.data)?;
            vec![data.object.into_record(ObjectId::new(data.id))]
        }
        MessageKind::PlayerLeft => {
            let data: LeftData = serde_json::from_value(envelope.data)?;
            vec![ObjectRecord::new(data.id, ObjectKind::default(), Position::ORIGIN)]
        }
        MessageKind::PositionUpdate => {
            let data: UpdateData = serde_json::from_value(envelope.data)?;
            let mut records = Vec::with_capacity(data.objects.len());
            for (key, object) in data.objects {
                let id = key.parse::<u32>().map_err(|_| {
                    Error::InvalidEnvelope(format!("object key {:?} is not a numeric id", key))
                })?;
                records.push(object.into_record(ObjectId::new(id)));
            }
            records
        }
        MessageKind::Unrecognized(_) => Vec::new(),
    };

    Ok(Message { kind, records })
}
