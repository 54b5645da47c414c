// src/core/protocol/codec.rs

//! Converts between raw frame payloads and `Document`s.
//!
//! Payloads are JSON objects. Types that JSON cannot express directly use
//! single-key wrapper objects: `{"$binary": "<hex>"}`, `{"$numberLong": "<n>"}`,
//! `{"$numberInt": "<n>"}` and `{"$numberDouble": "<f>"}` (the latter only for
//! non-finite values).

use super::document::{Document, Value};
use crate::core::GatewayError;
use bytes::Bytes;
use serde_json::{Map, Number, Value as Json};

const BINARY_KEY: &str = "$binary";
const LONG_KEY: &str = "$numberLong";
const INT_KEY: &str = "$numberInt";
const DOUBLE_KEY: &str = "$numberDouble";

/// Decodes a raw payload into a `Document`.
///
/// Any failure is reported as `GatewayError::Decode`, which the translator
/// maps to a non-retryable `FailedToParse`.
pub fn decode(raw: &[u8]) -> Result<Document, GatewayError> {
    let json: Json = serde_json::from_slice(raw)
        .map_err(|e| GatewayError::Decode(format!("invalid request document: {e}")))?;
    match json {
        Json::Object(map) => object_to_document(map),
        other => Err(GatewayError::Decode(format!(
            "request must be a document, got {}",
            json_kind(&other)
        ))),
    }
}

/// Encodes a `Document` into a raw payload.
pub fn encode(doc: &Document) -> Bytes {
    let json = Json::Object(document_to_object(doc));
    // Serializing a `serde_json::Value` with string keys cannot fail.
    Bytes::from(json.to_string())
}

fn object_to_document(map: Map<String, Json>) -> Result<Document, GatewayError> {
    map.into_iter()
        .map(|(k, v)| Ok((k, json_to_value(v)?)))
        .collect()
}

fn json_to_value(json: Json) -> Result<Value, GatewayError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::String(s) => Value::String(s),
        Json::Number(n) => number_to_value(&n),
        Json::Array(items) => Value::Array(
            items
                .into_iter()
                .map(json_to_value)
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => match wrapped_scalar(&map)? {
            Some(v) => v,
            None => Value::Document(object_to_document(map)?),
        },
    })
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(i),
        }
    } else {
        // u64 beyond i64::MAX or a number written with a fraction/exponent.
        Value::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Recognises the single-key wrapper objects used for non-JSON types.
fn wrapped_scalar(map: &Map<String, Json>) -> Result<Option<Value>, GatewayError> {
    if map.len() != 1 {
        return Ok(None);
    }
    let Some((key, Json::String(text))) = map.iter().next() else {
        return Ok(None);
    };
    let malformed = |what: &str| GatewayError::Decode(format!("invalid {what} value '{text}'"));

    let value = match key.as_str() {
        BINARY_KEY => Value::Binary(Bytes::from(
            hex::decode(text).map_err(|_| malformed(BINARY_KEY))?,
        )),
        LONG_KEY => Value::Int64(text.parse().map_err(|_| malformed(LONG_KEY))?),
        INT_KEY => Value::Int32(text.parse().map_err(|_| malformed(INT_KEY))?),
        DOUBLE_KEY => Value::Double(text.parse().map_err(|_| malformed(DOUBLE_KEY))?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn document_to_object(doc: &Document) -> Map<String, Json> {
    doc.iter()
        .map(|(k, v)| (k.to_string(), value_to_json(v)))
        .collect()
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Int32(i) => Json::Number(Number::from(*i)),
        Value::Int64(i) => wrap(LONG_KEY, i.to_string()),
        Value::Double(d) => match Number::from_f64(*d) {
            Some(n) => Json::Number(n),
            None => wrap(DOUBLE_KEY, d.to_string()),
        },
        Value::Binary(b) => wrap(BINARY_KEY, hex::encode(b)),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Document(d) => Json::Object(document_to_object(d)),
    }
}

fn wrap(key: &str, text: String) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), Json::String(text));
    Json::Object(map)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
