//! Request decoding.
//!
//! Builds the request value from the three binding sources in a fixed order:
//! body first, then query parameters, then path placeholders, so that path
//! and query values win over body fields of the same name. The merged value
//! is then checked for required fields and normalized through the typed
//! request; any failure there is `Malformed`, never a default request.

use hermes_core::{BodyBinding, CallDescription, DecodeError, Message};
use serde_json::{Map, Value};

use crate::scalar::coerce;
use crate::RawRequest;

/// Decodes a raw request into the normalized request value of `description`.
///
/// A path placeholder never binds the empty string, mirroring
/// [`encode`](crate::encode).
///
/// # Example
///
/// ```rust
/// use hermes_core::{AuthRequirement, Call, CommonErrorMessage, FieldDescriptor, Message, TypeDescriptor};
/// use hermes_extract::{decode, RawRequest};
/// use hermes_router::Params;
/// use bytes::Bytes;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct UsageRequest { path: Option<String> }
///
/// impl Message for UsageRequest {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::new("UsageRequest", vec![FieldDescriptor::of::<Option<String>>("path", false)])
///     }
/// }
///
/// let usage = Call::<UsageRequest, CommonErrorMessage, CommonErrorMessage>::builder("files.stats", "usage")
///     .path("/api/files/stats/usage")
///     .param("path")
///     .auth(AuthRequirement::read())
///     .build()
///     .unwrap();
///
/// let raw = RawRequest::new(Params::new(), Some("path=%2Fhome%2Falice%2F"), Bytes::new());
///
/// let value = decode(usage.description(), &raw).unwrap();
/// assert_eq!(value["path"], "/home/alice/");
/// ```
pub fn decode(description: &CallDescription, raw: &RawRequest) -> Result<Value, DecodeError> {
    let schema = description.request_schema();

    let mut object = match description.body() {
        BodyBinding::None => Map::new(),
        BodyBinding::EntireBody | BodyBinding::BoundFields => parse_body(raw)?,
    };

    if !description.params().is_empty() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw.query())
            .map_err(|e| DecodeError::malformed(format!("query string: {e}")))?;

        for binding in description.params() {
            let Some((_, value)) = pairs.iter().find(|(name, _)| *name == binding.query_name) else {
                object.remove(&binding.field);
                continue;
            };
            let field = schema
                .field(&binding.field)
                .ok_or_else(|| DecodeError::malformed(format!("no field '{}'", binding.field)))?;
            object.insert(binding.field.clone(), coerce(field, value)?);
        }
    }

    for (name, encoded) in raw.params().iter() {
        let Some(field) = schema.field(name) else {
            continue;
        };
        let decoded = urlencoding::decode(encoded)
            .map_err(|_| DecodeError::type_mismatch(name, "invalid percent-encoding"))?;
        if decoded.is_empty() {
            return Err(DecodeError::type_mismatch(name, "empty path component"));
        }
        object.insert(name.to_string(), coerce(field, &decoded)?);
    }

    if let Some(missing) = schema
        .required_fields()
        .find(|f| !object.contains_key(f.name))
    {
        return Err(DecodeError::missing(missing.name));
    }

    let value = description
        .normalize_request(Value::Object(object))
        .map_err(|e| DecodeError::malformed(e.to_string()))?;

    tracing::trace!(call = %description.full_name(), "request decoded");
    Ok(value)
}

/// Decodes a raw request straight into the typed request.
pub fn decode_as<Req: Message>(
    description: &CallDescription,
    raw: &RawRequest,
) -> Result<Req, DecodeError> {
    let value = decode(description, raw)?;
    serde_json::from_value(value).map_err(|e| DecodeError::malformed(e.to_string()))
}

fn parse_body(raw: &RawRequest) -> Result<Map<String, Value>, DecodeError> {
    if !raw.has_body() {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(raw.body()) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(DecodeError::malformed(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(DecodeError::malformed(e.to_string())),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
