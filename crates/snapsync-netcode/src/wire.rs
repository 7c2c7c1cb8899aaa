//! Binary wire format for server snapshots
//!
//! Little-endian, no padding:
//!
//! ```text
//! ┌──────────────┬────────────────┬──────────────────────────────────────┐
//! │ kind len u32 │ kind (UTF-8)   │ record * N                           │
//! └──────────────┴────────────────┴──────────────────────────────────────┘
//! record = id u32 │ kind code u8 │ x f32 │ y f32      (13 bytes)
//! ```
//!
//! Records have a fixed stride, so the decoder validates the body length
//! once and then walks it linearly without backtracking.

use crate::error::MalformedMessage;
use snapsync_core::{Message, MessageKind, ObjectId, ObjectKind, ObjectRecord, Position};

/// Size of the kind-length header
pub const HEADER_LEN_SIZE: usize = 4;

/// Size of one encoded object record
pub const RECORD_SIZE: usize = 4 + 1 + 4 + 4;

/// Decode one binary message
///
/// Fails if the buffer is shorter than its header, if the declared kind
/// length overruns the buffer, or if the bytes after the kind tag are not a
/// whole number of records. Unmapped kind codes decode to
/// `ObjectKind::Unknown` and never fail the message.
///
/// # Example
///
/// ```
/// use snapsync_core::{Message, MessageKind, ObjectKind, Position};
/// use snapsync_netcode::wire;
///
/// let msg = Message::player_joined(7, ObjectKind::Item, Position::new(1.0, 2.0));
/// let bytes = wire::encode(&msg);
/// let decoded = wire::decode(&bytes).unwrap();
/// assert_eq!(decoded.kind, MessageKind::PlayerJoined);
/// assert_eq!(decoded.records, msg.records);
/// ```
pub fn decode(buf: &[u8]) -> Result<Message, MalformedMessage> {
    let header: [u8; HEADER_LEN_SIZE] = buf
        .get(..HEADER_LEN_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(MalformedMessage::TruncatedHeader { len: buf.len() })?;
    let declared = u32::from_le_bytes(header) as usize;

    let rest = &buf[HEADER_LEN_SIZE..];
    if declared > rest.len() {
        return Err(MalformedMessage::KindLengthOverrun {
            declared,
            remaining: rest.len(),
        });
    }
    let (tag, body) = rest.split_at(declared);
    let tag = std::str::from_utf8(tag).map_err(|_| MalformedMessage::InvalidKindText)?;

    let body_offset = HEADER_LEN_SIZE + declared;
    let trailing = body.len() % RECORD_SIZE;
    if trailing != 0 {
        return Err(MalformedMessage::TruncatedRecord {
            offset: body_offset + body.len() - trailing,
            remaining: trailing,
        });
    }

    let records = body
        .chunks_exact(RECORD_SIZE)
        .filter_map(|chunk| <[u8; RECORD_SIZE]>::try_from(chunk).ok())
        .map(decode_record)
        .collect();

    Ok(Message {
        kind: MessageKind::from_tag(tag),
        records,
    })
}

fn decode_record(bytes: [u8; RECORD_SIZE]) -> ObjectRecord {
    let [i0, i1, i2, i3, code, x0, x1, x2, x3, y0, y1, y2, y3] = bytes;
    let id = ObjectId::new(u32::from_le_bytes([i0, i1, i2, i3]));
    let kind = ObjectKind::from_code(code);
    if kind.is_unknown() {
        tracing::warn!(%id, code, "unknown object kind code");
    }

    ObjectRecord {
        id,
        kind,
        position: Position::new(
            f32::from_le_bytes([x0, x1, x2, x3]),
            f32::from_le_bytes([y0, y1, y2, y3]),
        ),
    }
}

/// Encode a message into the binary wire format
///
/// `ObjectKind::Unknown` is written as `ObjectKind::UNKNOWN_CODE`.
pub fn encode(message: &Message) -> Vec<u8> {
    let tag = message.kind.as_tag().as_bytes();
    let mut buf =
        Vec::with_capacity(HEADER_LEN_SIZE + tag.len() + message.records.len() * RECORD_SIZE);

    buf.extend_from_slice(&(tag.len() as u32).to_le_bytes());
    buf.extend_from_slice(tag);
    for record in &message.records {
        buf.extend_from_slice(&record.id.raw().to_le_bytes());
        buf.push(record.kind.code());
        buf.extend_from_slice(&record.position.x.to_le_bytes());
        buf.extend_from_slice(&record.position.y.to_le_bytes());
    }
    buf
}

/// Byte offset of the record at `index`, given the kind tag length
pub fn record_offset(kind_len: usize, index: usize) -> usize {
    HEADER_LEN_SIZE + kind_len + index * RECORD_SIZE
}
