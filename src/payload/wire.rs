//! Field-level walk over the protobuf wire format
//!
//! Only the fields on the target path are decoded and re-encoded. Every other
//! field is copied through as the exact bytes it was read from, which keeps
//! unknown fields and their ordering intact.

use prost::bytes::Buf;
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};

/// Reason a payload could not be walked
pub type WireError = String;

/// One top-level field of a message, borrowed from the input
struct RawField<'a> {
    tag: u32,
    wire_type: WireType,
    /// Key and value bytes exactly as they appeared
    bytes: &'a [u8],
    /// Value bytes; for length-delimited fields this excludes the length prefix
    value: &'a [u8],
}

fn next_field<'a>(buf: &mut &'a [u8]) -> Result<RawField<'a>, WireError> {
    let start: &'a [u8] = *buf;
    let (tag, wire_type) = decode_key(buf).map_err(|e| e.to_string())?;
    let value_start: &'a [u8] = *buf;

    let value: &'a [u8] = match wire_type {
        WireType::Varint => {
            decode_varint(buf).map_err(|e| e.to_string())?;
            &value_start[..value_start.len() - buf.len()]
        }
        WireType::SixtyFourBit => take(buf, 8, tag)?,
        WireType::ThirtyTwoBit => take(buf, 4, tag)?,
        WireType::LengthDelimited => {
            let len = decode_varint(buf).map_err(|e| e.to_string())?;
            let len = usize::try_from(len)
                .map_err(|_| format!("field {} length {} does not fit in memory", tag, len))?;
            take(buf, len, tag)?
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(format!("field {} uses unsupported group encoding", tag));
        }
    };

    let consumed = start.len() - buf.len();
    Ok(RawField {
        tag,
        wire_type,
        bytes: &start[..consumed],
        value,
    })
}

fn take<'a>(buf: &mut &'a [u8], len: usize, tag: u32) -> Result<&'a [u8], WireError> {
    if buf.remaining() < len {
        return Err(format!(
            "field {} needs {} bytes but only {} remain",
            tag,
            len,
            buf.remaining()
        ));
    }
    let slice: &'a [u8] = *buf;
    let value = &slice[..len];
    buf.advance(len);
    Ok(value)
}

fn encode_leaf(tag: u32, value: u64, out: &mut Vec<u8>) {
    encode_key(tag, WireType::Varint, out);
    encode_varint(value, out);
}

fn encode_nested(tag: u32, body: &[u8], out: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, out);
    encode_varint(body.len() as u64, out);
    out.extend_from_slice(body);
}

/// Set the varint field at `path` to `value`, returning the re-encoded message
///
/// Missing messages along the path are created. Repeated occurrences of the
/// leaf collapse into a single field at the position of the first one.
pub fn set_varint(input: &[u8], path: &[u32], value: u64) -> Result<Vec<u8>, WireError> {
    let Some((&head, rest)) = path.split_first() else {
        return Err("empty field path".to_string());
    };

    let mut out = Vec::with_capacity(input.len() + 12);
    let mut buf = input;
    let mut written = false;

    while buf.has_remaining() {
        let field = next_field(&mut buf)?;

        if field.tag != head {
            out.extend_from_slice(field.bytes);
            continue;
        }

        if rest.is_empty() {
            if field.wire_type != WireType::Varint {
                return Err(format!(
                    "timestamp field {} has wire type {:?}, expected varint",
                    head, field.wire_type
                ));
            }
            if !written {
                encode_leaf(head, value, &mut out);
                written = true;
            }
        } else {
            if field.wire_type != WireType::LengthDelimited {
                return Err(format!(
                    "field {} has wire type {:?}, expected an embedded message",
                    head, field.wire_type
                ));
            }
            let body = set_varint(field.value, rest, value)
                .map_err(|e| format!("in field {}: {}", head, e))?;
            encode_nested(head, &body, &mut out);
            written = true;
        }
    }

    if !written {
        if rest.is_empty() {
            encode_leaf(head, value, &mut out);
        } else {
            let body = set_varint(&[], rest, value)?;
            encode_nested(head, &body, &mut out);
        }
    }

    Ok(out)
}

/// Read the varint field at `path`, following last-wins semantics
pub fn get_varint(input: &[u8], path: &[u32]) -> Result<Option<u64>, WireError> {
    let Some((&head, rest)) = path.split_first() else {
        return Err("empty field path".to_string());
    };

    let mut buf = input;
    let mut found = None;

    while buf.has_remaining() {
        let field = next_field(&mut buf)?;
        if field.tag != head {
            continue;
        }
        if rest.is_empty() {
            if field.wire_type != WireType::Varint {
                return Err(format!("field {} is not a varint", head));
            }
            let mut value = field.value;
            found = Some(decode_varint(&mut value).map_err(|e| e.to_string())?);
        } else {
            if field.wire_type != WireType::LengthDelimited {
                return Err(format!("field {} is not an embedded message", head));
            }
            if let Some(v) = get_varint(field.value, rest)? {
                found = Some(v);
            }
        }
    }

    Ok(found)
}
