//! # Hermes Extract
//!
//! The binding resolver: converts between raw transport requests and the
//! request values of call descriptions.
//!
//! | Function | Direction |
//! |----------|-----------|
//! | [`decode`] / [`decode_as`] | raw request → request value (server) |
//! | [`encode`] / [`encode_typed`] | request value → raw request (client) |
//! | [`JsonResponse`] | response value → raw response (server) |
//! | [`decode_response`] | raw response → [`Reply`] or [`ClientError`] (client) |
//!
//! Decoding and encoding are inverse: for every valid request value `v` of a
//! description, decoding the encoded request yields `v` again.
//!
//! ## Binding rules
//!
//! - Placeholders consume one percent-decoded path component and are coerced
//!   by the field's kind. Coercion failures are `TypeMismatch`.
//! - Query parameters are matched case-sensitively; the first occurrence wins
//!   and unknown parameters are ignored.
//! - An empty body decodes as `{}`; any other body must be a JSON object.
//! - Path and query values win over body fields of the same name.
//! - Required fields are checked after merging (`Missing`), then the value is
//!   normalized through the typed request (`Malformed` on failure).

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod decode;
mod encode;
mod response;
mod scalar;

pub use context::RawRequest;
pub use decode::{decode, decode_as};
pub use encode::{encode, encode_typed, EncodeError};
pub use response::{decode_response, ClientError, JsonResponse, Reply};
