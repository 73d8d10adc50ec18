//! Request encoding, the client-side inverse of [`decode`](crate::decode).

use bytes::Bytes;
use hermes_core::{BodyBinding, CallDescription, Message, PathSegment};
use http::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

use crate::scalar::render;

/// Errors raised while encoding a request value.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value is not a valid instance of the request type.
    #[error("request is not a valid {type_name}: {reason}")]
    InvalidRequest {
        /// Request type name.
        type_name: &'static str,
        /// Deserializer message.
        reason: String,
    },

    /// A path placeholder has no value.
    #[error("path field '{field}' has no value")]
    MissingPathField {
        /// Field name.
        field: String,
    },

    /// A path placeholder would produce an empty component.
    #[error("path field '{field}' is empty")]
    EmptyPathSegment {
        /// Field name.
        field: String,
    },

    /// A path or query field holds an array or object.
    #[error("field '{field}' is not a scalar")]
    NotScalar {
        /// Field name.
        field: String,
    },

    /// Query string serialization failed.
    #[error("query string: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    /// Value serialization failed.
    #[error("serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The transport request could not be assembled.
    #[error("request: {0}")]
    Http(#[from] http::Error),
}

/// Encodes a request value into a transport request for `description`.
///
/// Path placeholders are filled from their fields and percent-encoded.
///
/// # Errors
///
/// A path-bound field whose rendered value is `""` fails with
/// [`EncodeError::EmptyPathSegment`]: an empty component cannot be told
/// apart from a missing one, and the router drops empty segments. Calls
/// that must accept an empty string bind that field to the query or body.
pub fn encode(description: &CallDescription, value: &Value) -> Result<http::Request<Bytes>, EncodeError> {
    let normalized = description
        .normalize_request(value.clone())
        .map_err(|e| EncodeError::InvalidRequest {
            type_name: description.request_schema().name,
            reason: e.to_string(),
        })?;
    let Value::Object(mut object) = normalized else {
        return Err(EncodeError::InvalidRequest {
            type_name: description.request_schema().name,
            reason: "expected an object".to_string(),
        });
    };

    let mut uri = String::new();
    for segment in description.path() {
        uri.push('/');
        match segment {
            PathSegment::Literal(literal) => uri.push_str(literal),
            PathSegment::Param(field) => {
                let rendered = object
                    .remove(field)
                    .map(|v| component(field, &v))
                    .transpose()?
                    .flatten()
                    .ok_or_else(|| EncodeError::MissingPathField {
                        field: field.clone(),
                    })?;
                if rendered.is_empty() {
                    return Err(EncodeError::EmptyPathSegment {
                        field: field.clone(),
                    });
                }
                uri.push_str(&urlencoding::encode(&rendered));
            }
        }
    }
    if uri.is_empty() {
        uri.push('/');
    }

    let mut pairs = Vec::new();
    for binding in description.params() {
        if let Some(value) = object.remove(&binding.field) {
            if let Some(rendered) = component(&binding.field, &value)? {
                pairs.push((binding.query_name.as_str(), rendered));
            }
        }
    }
    if !pairs.is_empty() {
        uri.push('?');
        uri.push_str(&serde_urlencoded::to_string(&pairs)?);
    }

    let mut builder = http::Request::builder()
        .method(description.method().clone())
        .uri(uri);

    let body = match description.body() {
        BodyBinding::None => Bytes::new(),
        BodyBinding::EntireBody | BodyBinding::BoundFields => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Bytes::from(serde_json::to_vec(&Value::Object(object))?)
        }
    };

    Ok(builder.body(body)?)
}

/// Encodes a typed request.
pub fn encode_typed<Req: Message>(
    description: &CallDescription,
    request: &Req,
) -> Result<http::Request<Bytes>, EncodeError> {
    encode(description, &serde_json::to_value(request)?)
}

fn component(field: &str, value: &Value) -> Result<Option<String>, EncodeError> {
    render(value).map_err(|()| EncodeError::NotScalar {
        field: field.to_string(),
    })
}
