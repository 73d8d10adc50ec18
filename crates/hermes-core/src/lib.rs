//! # Hermes Core
//!
//! Core types and traits for the Hermes call-description framework.
//!
//! This crate provides the foundational types used throughout Hermes:
//!
//! - [`CallDescription`] / [`Call`] - The contract of one operation and its typed handle
//! - [`TypeDescriptor`] / [`Message`] - Compile-time field tables of request, response and error types
//! - [`CallError`] - Error taxonomy shared by every stage of request handling
//! - [`RequestContext`] - Per-request identity, project and deadline
//! - [`EventEnvelope`] - The durable record of a published call
//! - [`Handler`] - The handler contract
//! - [`PathSegment`] / [`parse_template`] - Path templates shared by calls and the router

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod call;
mod context;
mod envelope;
mod error;
mod handler;
mod identity;
pub mod schema;
mod template;

pub use call::{
    AuthRequirement, BodyBinding, Call, CallBuilder, CallDescription, DescriptionError,
    DispatchMode, ParamBinding,
};
pub use context::{RequestContext, RequestId};
pub use envelope::{Acknowledgement, EventEnvelope};
pub use error::{
    CallError, CallResult, DecodeError, DecodeReason, DenyReason, DispatchFailure,
    ErrorCategory, ErrorDetail, ErrorEnvelope,
};
pub use handler::{declared_status, Handler, HandlerError};
pub use identity::{AccessRight, Principal, Role, ScopeParseError, SecurityScope};
pub use schema::{
    CommonErrorMessage, Empty, ErrorMessage, FieldDescriptor, FieldKind, FieldType, IntRange,
    Message, TypeDescriptor,
};
pub use template::{parse_template, PathSegment, TemplateError, SUPPORTED_METHODS};
