// src/core/commands/helpers.rs

//! Provides helper functions for extracting command parameters from request documents.
//! These helpers reduce boilerplate and keep error messages consistent across commands.

use crate::core::GatewayError;
use crate::core::protocol::{Document, ErrorCode, Value};

/// Longest accepted collection name, in bytes.
pub const MAX_COLLECTION_NAME_LEN: usize = 235;

/// Returns a required string field, or a `MissingField`/`TypeMismatch` error naming it.
pub fn get_required_str<'d>(
    doc: &'d Document,
    command: &str,
    field: &str,
) -> Result<&'d str, GatewayError> {
    let value = doc.get(field).ok_or_else(|| {
        GatewayError::with_argument(
            ErrorCode::MissingField,
            format!("BSON field '{command}.{field}' is missing but a required field"),
            field,
        )
    })?;
    value.as_str().ok_or_else(|| {
        let msg = if field == command {
            format!("collection name has invalid type {}", value.type_name())
        } else {
            format!(
                "BSON field '{command}.{field}' is the wrong type '{}', expected type 'string'",
                value.type_name()
            )
        };
        GatewayError::with_argument(ErrorCode::TypeMismatch, msg, field)
    })
}

/// The database a command targets, taken from `$db`.
pub fn get_db<'d>(doc: &'d Document, command: &str) -> Result<&'d str, GatewayError> {
    get_required_str(doc, command, "$db")
}

/// Checks a collection name against the namespace rule: 1 to 235 bytes, no
/// leading `.`, and no `$` or NUL anywhere.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && !name.starts_with('.')
        && !name.contains(['$', '\0'])
}

/// Reads the optional `scale` field. Absent and `null` mean 1; any numeric
/// kind is accepted.
pub fn get_scale(doc: &Document, command: &str) -> Result<f64, GatewayError> {
    match doc.get("scale") {
        None | Some(Value::Null) => Ok(1.0),
        Some(v) => v.as_f64().ok_or_else(|| {
            GatewayError::with_argument(
                ErrorCode::TypeMismatch,
                format!(
                    "BSON field '{command}.scale' is the wrong type '{}', expected types '[long, int, decimal, double]'",
                    v.type_name()
                ),
                command,
            )
        }),
    }
}

/// Reads the array of session descriptors carried under the command key.
pub fn get_session_ids<'d>(doc: &'d Document, command: &str) -> Result<&'d [Value], GatewayError> {
    match doc.get(command) {
        Some(Value::Array(ids)) => Ok(ids.as_slice()),
        Some(v) => Err(GatewayError::with_argument(
            ErrorCode::TypeMismatch,
            format!(
                "BSON field '{command}' is the wrong type '{}', expected type 'array'",
                v.type_name()
            ),
            command,
        )),
        None => Err(GatewayError::with_argument(
            ErrorCode::MissingField,
            format!("BSON field '{command}' is missing but a required field"),
            command,
        )),
    }
}
