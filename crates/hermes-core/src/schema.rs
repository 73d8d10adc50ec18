//! Structural type descriptors.
//!
//! The binding layer never inspects Rust types at runtime. Instead every
//! request, response and error type carries an explicit [`TypeDescriptor`]:
//! an ordered table of field names, primitive kinds and requiredness.
//! `#[derive(Message)]` generates the table at compile time from the struct
//! definition, resolving each field's kind through the [`FieldType`] trait,
//! so a field whose type has no binding kind is a compile error rather than a
//! runtime surprise.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{FieldDescriptor, FieldKind, Message, TypeDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct UsageRequest {
//!     path: Option<String>,
//! }
//!
//! impl Message for UsageRequest {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::new(
//!             "UsageRequest",
//!             vec![FieldDescriptor::of::<Option<String>>("path", false)],
//!         )
//!     }
//! }
//!
//! let descriptor = UsageRequest::descriptor();
//! assert_eq!(descriptor.field("path").unwrap().kind, FieldKind::String);
//! assert!(!descriptor.field("path").unwrap().required);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Primitive kind of a field, as far as binding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 text.
    String,
    /// Signed or unsigned integer within the Rust type's range.
    Integer(IntRange),
    /// Floating point number.
    Float,
    /// `true` / `false`.
    Boolean,
    /// One of a fixed set of wire names.
    Enum(&'static [&'static str]),
    /// Arrays, maps and nested messages. Only bindable through the body.
    Structured,
}

impl FieldKind {
    /// Returns `true` if values of this kind fit in one path or query component.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Structured)
    }
}

/// Inclusive value range of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    /// Smallest accepted value.
    pub min: i128,
    /// Largest accepted value.
    pub max: i128,
}

impl IntRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: i128, max: i128) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` fits.
    #[must_use]
    pub const fn contains(&self, value: i128) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One field of a [`TypeDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Wire name of the field (after serde renames).
    pub name: &'static str,
    /// Primitive kind.
    pub kind: FieldKind,
    /// Whether the field must be present when decoding.
    pub required: bool,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
        }
    }

    /// Creates a descriptor for a field of Rust type `T`.
    ///
    /// The field is required unless `T` is optional or `has_default` is set.
    #[must_use]
    pub const fn of<T: FieldType + ?Sized>(name: &'static str, has_default: bool) -> Self {
        Self::new(name, T::KIND, !T::OPTIONAL && !has_default)
    }
}

/// Ordered field table of a message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type name, used in diagnostics only.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Rust fields that never travel on the wire (`#[serde(skip)]`).
    ///
    /// A request with skipped fields cannot be replayed from its event
    /// without losing them.
    pub skipped: Vec<&'static str>,
}

impl TypeDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            fields,
            skipped: Vec::new(),
        }
    }

    /// Records fields the serialized form leaves out.
    #[must_use]
    pub fn with_skipped(mut self, skipped: Vec<&'static str>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Creates a descriptor without fields.
    #[must_use]
    pub fn empty(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    /// Looks up a field by wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterates over required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// A type that can travel as a call's request, response or error.
///
/// Usually implemented with `#[derive(Message)]`.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the field table of this type.
    fn descriptor() -> TypeDescriptor;
}

/// A message type that can be a call's declared error shape.
///
/// Framework failures detected after a call is resolved (bad input, denied
/// access, failed publish) are rendered in the declared error shape when the
/// type can carry a plain message, so clients only ever parse one error
/// format per call.
pub trait ErrorMessage: Message {
    /// Builds an error instance from a framework message, if the shape allows it.
    fn from_framework_message(message: &str) -> Option<Self> {
        let _ = message;
        None
    }
}

/// Compile-time binding kind of a Rust type.
///
/// Implemented for primitives, strings, options, collections and (through
/// the derives) for messages and unit enums.
pub trait FieldType {
    /// Binding kind.
    const KIND: FieldKind;
    /// Whether an absent value is acceptable.
    const OPTIONAL: bool = false;
}

macro_rules! field_kind {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$kind;
        })+
    };
}

macro_rules! integer_kind {
    ($($ty:ty),+ $(,)?) => {
        $(impl FieldType for $ty {
            const KIND: FieldKind =
                FieldKind::Integer(IntRange::new(<$ty>::MIN as i128, <$ty>::MAX as i128));
        })+
    };
}

field_kind!(String => String, str, char, uuid::Uuid);
integer_kind!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
field_kind!(Float => f32, f64);
field_kind!(Boolean => bool);
field_kind!(Structured => serde_json::Value);

impl<T: FieldType> FieldType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const OPTIONAL: bool = true;
}

impl<T: FieldType + ?Sized> FieldType for Box<T> {
    const KIND: FieldKind = T::KIND;
    const OPTIONAL: bool = T::OPTIONAL;
}

impl<T> FieldType for Vec<T> {
    const KIND: FieldKind = FieldKind::Structured;
}

impl<K, V, S> FieldType for HashMap<K, V, S> {
    const KIND: FieldKind = FieldKind::Structured;
}

impl<K, V> FieldType for BTreeMap<K, V> {
    const KIND: FieldKind = FieldKind::Structured;
}

/// A message without fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

impl Message for Empty {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::empty("Empty")
    }
}

impl ErrorMessage for Empty {}

impl FieldType for Empty {
    const KIND: FieldKind = FieldKind::Structured;
}

/// The error shape shared by most calls: a single human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonErrorMessage {
    /// Why the call failed.
    pub why: String,
}

impl CommonErrorMessage {
    /// Creates an error message.
    #[must_use]
    pub fn new(why: impl Into<String>) -> Self {
        Self { why: why.into() }
    }
}

impl Message for CommonErrorMessage {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "CommonErrorMessage",
            vec![FieldDescriptor::of::<String>("why", false)],
        )
    }
}

impl ErrorMessage for CommonErrorMessage {
    fn from_framework_message(message: &str) -> Option<Self> {
        Some(Self::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_kinds() {
        assert_eq!(
            <u64 as FieldType>::KIND,
            FieldKind::Integer(IntRange::new(0, i128::from(u64::MAX)))
        );
        assert_eq!(<f32 as FieldType>::KIND, FieldKind::Float);
        assert_eq!(<bool as FieldType>::KIND, FieldKind::Boolean);
        assert_eq!(<String as FieldType>::KIND, FieldKind::String);
        assert_eq!(<Vec<String> as FieldType>::KIND, FieldKind::Structured);
    }

    #[test]
    fn test_option_is_not_required() {
        let field = FieldDescriptor::of::<Option<i64>>("limit", false);
        assert!(matches!(field.kind, FieldKind::Integer(_)));
        assert!(!field.required);

        let field = FieldDescriptor::of::<i64>("limit", true);
        assert!(!field.required);

        let field = FieldDescriptor::of::<i64>("limit", false);
        assert!(field.required);
    }

    #[test]
    fn test_integer_ranges_follow_the_rust_type() {
        let FieldKind::Integer(range) = <u32 as FieldType>::KIND else {
            panic!("u32 is an integer");
        };
        assert!(range.contains(0));
        assert!(range.contains(i128::from(u32::MAX)));
        assert!(!range.contains(-1));
        assert!(!range.contains(i128::from(u32::MAX) + 1));

        let FieldKind::Integer(range) = <Option<i8> as FieldType>::KIND else {
            panic!("i8 is an integer");
        };
        assert_eq!(range, IntRange::new(-128, 127));
    }

    #[test]
    fn test_scalar_kinds() {
        assert!(FieldKind::Enum(&["A"]).is_scalar());
        assert!(FieldKind::Boolean.is_scalar());
        assert!(!FieldKind::Structured.is_scalar());
    }

    #[test]
    fn test_common_error_message_from_framework() {
        let err = CommonErrorMessage::from_framework_message("Bad request").unwrap();
        assert_eq!(err.why, "Bad request");
        assert!(Empty::from_framework_message("ignored").is_none());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"why": "Bad request"})
        );
    }

    #[test]
    fn test_descriptor_lookup() {
        let descriptor = CommonErrorMessage::descriptor();
        assert_eq!(descriptor.name, "CommonErrorMessage");
        assert!(descriptor.field("why").is_some());
        assert!(descriptor.field("reason").is_none());
        assert_eq!(descriptor.required_fields().count(), 1);
    }
}
