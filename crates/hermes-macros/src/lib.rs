//! Derive macros for Hermes message types.
//!
//! Hermes binds request fields to paths, query parameters and bodies using
//! an explicit field table per type instead of runtime reflection. These
//! derives generate that table from the struct definition, honouring the
//! serde attributes that change the wire shape.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_macros::{FieldType, Message};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, FieldType)]
//! #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
//! enum SortOrder { Ascending, Descending }
//!
//! #[derive(Serialize, Deserialize, Message)]
//! #[serde(rename_all = "camelCase")]
//! struct ListFilesRequest {
//!     folder_id: u64,
//!     #[serde(default)]
//!     items_per_page: u32,
//!     order: Option<SortOrder>,
//! }
//! ```
//!
//! # Supported serde attributes
//!
//! - container: `rename_all`, `default`
//! - field: `rename`, `default`, `skip`, `skip_deserializing`
//! - variant: `rename`
//!
//! `flatten` is rejected because it hides fields from the table.
//!
//! Generated code refers to `::hermes_core`. Crates that reach the core
//! types through another path set `#[message(crate = "path::to::core")]`.

mod expand;
mod parse;
mod rename;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `hermes_core::Message` (and `FieldType`) for a struct with named fields.
///
/// # Generated Code
///
/// ```rust,ignore
/// impl ::hermes_core::Message for ListFilesRequest {
///     fn descriptor() -> ::hermes_core::TypeDescriptor {
///         ::hermes_core::TypeDescriptor::new("ListFilesRequest", vec![
///             ::hermes_core::FieldDescriptor::of::<u64>("folderId", false),
///             ::hermes_core::FieldDescriptor::of::<u32>("itemsPerPage", true),
///             ::hermes_core::FieldDescriptor::of::<Option<SortOrder>>("order", false),
///         ])
///     }
/// }
/// ```
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::expand_message(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `hermes_core::FieldType` for a unit-only enum, making it an
/// enum-kind field that can be bound to a path or query parameter.
#[proc_macro_derive(FieldType, attributes(message))]
pub fn derive_field_type(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::expand_field_type(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
