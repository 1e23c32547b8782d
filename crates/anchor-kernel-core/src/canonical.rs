//! Canonical CBOR encoding for deterministic serialization.
//!
//! Records are JSON documents. Before hashing they are encoded as CBOR
//! (RFC 8949) with deterministic rules:
//! - The top-level `$id` field is stripped (identifiers are derived, not content)
//! - Map keys sorted by encoded byte comparison, at every nesting level
//! - Integers use smallest valid encoding
//! - Floats always use the 8-byte form; non-finite floats are rejected
//! - Definite lengths only
//!
//! Hashing always runs over the raw canonical bytes. Base64 is applied only
//! when the bytes travel as a blob.
//!
//! **CRITICAL**: This encoding is FROZEN. Changes re-address every record.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ciborium::value::Value;
use serde_json::{Map, Number, Value as Json};

use crate::error::CoreError;

/// Name of the identifier field stripped before canonicalization.
pub const ID_FIELD: &str = "$id";

/// Deterministic CBOR bytes of a record's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The CBOR byte-string header for these bytes followed by the bytes.
    ///
    /// This is the length-prefixed form hashed during identifier derivation.
    pub fn length_prefixed(&self) -> Vec<u8> {
        length_prefixed(&self.0)
    }

    /// Transport-encode for use as a blob.
    pub fn to_blob(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Prefix arbitrary bytes with their CBOR byte-string header.
pub fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len() + 9);
    encode_bytes(&mut buf, bytes);
    buf
}

/// Canonicalize a record.
///
/// The record must be a JSON object. Its top-level `$id` is ignored.
pub fn canonicalize(record: &Json) -> Result<CanonicalBytes, CoreError> {
    let object = record.as_object().ok_or_else(|| {
        CoreError::MalformedInput(format!("expected a keyed structure, got {}", json_type(record)))
    })?;

    let entries = object
        .iter()
        .filter(|(k, _)| k.as_str() != ID_FIELD)
        .map(|(k, v)| Ok((Value::Text(k.clone()), json_to_cbor(v)?)))
        .collect::<Result<Vec<_>, CoreError>>()?;

    let mut buf = Vec::new();
    encode_map(&mut buf, &entries)?;
    Ok(CanonicalBytes(buf))
}

/// Decode a blob back into a JSON record.
///
/// Reverses the transport encoding, parses the CBOR, and rejects the blob if
/// it is not already in canonical form.
pub fn decode_blob(blob: &str) -> Result<Json, CoreError> {
    let bytes = STANDARD
        .decode(blob)
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let value: Value = ciborium::from_reader(std::io::Cursor::new(&bytes))
        .map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let record = cbor_to_json(&value)?;

    let recanonical = canonicalize(&record)?;
    if recanonical.as_slice() != bytes.as_slice() {
        return Err(CoreError::DecodingError("blob is not in canonical form".into()));
    }

    Ok(record)
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Convert a JSON value into a CBOR value.
fn json_to_cbor(value: &Json) -> Result<Value, CoreError> {
    Ok(match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Integer(u.into())
            } else if let Some(i) = n.as_i64() {
                Value::Integer(i.into())
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| CoreError::MalformedInput(format!("unrepresentable number {n}")))?;
                if !f.is_finite() {
                    return Err(CoreError::MalformedInput("non-finite number".into()));
                }
                Value::Float(f)
            }
        }
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::Array(
            items
                .iter()
                .map(json_to_cbor)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| Ok((Value::Text(k.clone()), json_to_cbor(v)?)))
                .collect::<Result<Vec<_>, CoreError>>()?,
        ),
    })
}

/// Convert a decoded CBOR value back into JSON.
fn cbor_to_json(value: &Value) -> Result<Json, CoreError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if let Ok(u) = u64::try_from(n) {
                Json::Number(u.into())
            } else if let Ok(s) = i64::try_from(n) {
                Json::Number(s.into())
            } else {
                return Err(CoreError::DecodingError(format!("integer out of range: {n}")));
            }
        }
        Value::Float(f) => Json::Number(
            Number::from_f64(*f)
                .ok_or_else(|| CoreError::DecodingError("non-finite number".into()))?,
        ),
        Value::Text(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(cbor_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match k {
                    Value::Text(s) => s.clone(),
                    _ => return Err(CoreError::DecodingError("map keys must be text".into())),
                };
                if map.insert(key, cbor_to_json(v)?).is_some() {
                    return Err(CoreError::DecodingError("duplicate map key".into()));
                }
            }
            Json::Object(map)
        }
        _ => return Err(CoreError::DecodingError("unsupported CBOR item".into())),
    })
}

/// Recursively encode a CBOR value.
fn encode_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_be_bytes());
        }
        _ => return Err(CoreError::EncodingError("unsupported CBOR value type".into())),
    }
    Ok(())
}

fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value(buf, item)?;
    }
    Ok(())
}

fn encode_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    // RFC 8949 canonical: sort keys by CBOR-encoded bytes
    let mut sorted = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_bytes = Vec::new();
        encode_value(&mut key_bytes, k)?;
        sorted.push((key_bytes, v));
    }
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, sorted.len() as u64);
    for (key_bytes, v) in sorted {
        buf.extend_from_slice(&key_bytes);
        encode_value(buf, v)?;
    }
    Ok(())
}
