//! # Host Values
//!
//! The encoder accepts any type implementing [`Encode`]. The trait exposes
//! the capabilities the encoder dispatches on, each a default method that
//! answers `None`:
//!
//! - [`Encode::as_marshaler`]: the value overrides its own encoding through
//!   a [`Marshaler`] hook.
//! - [`Encode::as_node`]: the value already is a [`NodeTree`].
//! - [`Encode::to_value`]: the value maps onto a built-in [`Value`].
//! - [`Encode::elements`]: the value is a sequence of encodable elements.
//! - [`Encode::as_fields`]: the value is an aggregate with named fields,
//!   declared in order through [`FieldEnumerable`].
//!
//! A host type declares conformance explicitly:
//!
//! ```
//! use tyaml_core::{Encode, Field, FieldEnumerable};
//!
//! struct Server {
//!     host: String,
//!     port: i64,
//!     tags: Vec<String>,
//! }
//!
//! impl FieldEnumerable for Server {
//!     fn fields(&self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("host", &self.host),
//!             Field::new("port", &self.port),
//!             Field::new("tags", &self.tags).omit_empty(),
//!         ]
//!     }
//! }
//!
//! impl Encode for Server {
//!     fn as_fields(&self) -> Option<&dyn FieldEnumerable> {
//!         Some(self)
//!     }
//! }
//!
//! let server = Server { host: "example.com".into(), port: 22, tags: vec![] };
//! assert_eq!(tyaml_core::encode(&server).unwrap(), "host: example.com\nport: 22\n");
//! ```

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};

use crate::error::MarshalError;
use crate::node::NodeTree;
use crate::value::{Mapping, TypeDescriptor, Value};

/// The replacement representation produced by a [`Marshaler`].
#[derive(Debug, Clone, PartialEq)]
pub enum Marshaled {
    /// Encode this value in place of the host value.
    Value(Value),
    /// Emit this node tree as-is, with full control over tags and styles.
    Node(NodeTree),
}

impl From<Value> for Marshaled {
    fn from(value: Value) -> Self {
        Marshaled::Value(value)
    }
}

impl From<NodeTree> for Marshaled {
    fn from(tree: NodeTree) -> Self {
        Marshaled::Node(tree)
    }
}

/// A hook that lets a host value override its own encoding.
///
/// The hook runs behind a fault boundary: a returned error and a panic both
/// become [`Error::Encode`](crate::Error::Encode) for the sub-document the
/// hook was producing.
pub trait Marshaler {
    /// Produce the replacement representation.
    fn marshal_yaml(&self) -> Result<Marshaled, MarshalError>;
}

/// One named field of a host aggregate.
pub struct Field<'a> {
    name: Cow<'a, str>,
    omit_empty: bool,
    value: &'a dyn Encode,
}

impl<'a> Field<'a> {
    /// A field named `name`.
    pub fn new(name: impl Into<Cow<'a, str>>, value: &'a dyn Encode) -> Self {
        Self {
            name: name.into(),
            omit_empty: false,
            value,
        }
    }

    /// Leave the field out when its value is empty (null, false, zero, or
    /// an empty string, binary or collection).
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// The key the field is emitted under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field is dropped when empty.
    pub fn is_omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// The field value.
    pub fn value(&self) -> &'a dyn Encode {
        self.value
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("omit_empty", &self.omit_empty)
            .field("type", &self.value.type_name())
            .finish()
    }
}

/// A host aggregate with named fields, in declaration order.
pub trait FieldEnumerable {
    /// The fields to emit, in output order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// A value the encoder can emit.
pub trait Encode {
    /// The extension hook, tried first.
    fn as_marshaler(&self) -> Option<&dyn Marshaler> {
        None
    }

    /// A node tree emitted as-is.
    fn as_node(&self) -> Option<&NodeTree> {
        None
    }

    /// The built-in value this maps to.
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        None
    }

    /// Sequence elements.
    fn elements(&self) -> Option<Vec<&dyn Encode>> {
        None
    }

    /// Named fields.
    fn as_fields(&self) -> Option<&dyn FieldEnumerable> {
        None
    }

    /// Runtime type name used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Whether an omit-empty field with this value is dropped.
pub(crate) fn is_empty_value(subject: &dyn Encode) -> bool {
    if subject.as_marshaler().is_some() {
        return false;
    }
    if let Some(tree) = subject.as_node() {
        return tree.root().is_none();
    }
    if let Some(value) = subject.to_value() {
        return value.is_empty();
    }
    if let Some(elements) = subject.elements() {
        return elements.is_empty();
    }
    false
}

// ---------------------------------------------------------------------------
// Implementations for library and standard types
// ---------------------------------------------------------------------------

impl Encode for Value {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Borrowed(self))
    }
}

impl Encode for Mapping {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Mapping(self.clone())))
    }
}

impl Encode for NodeTree {
    fn as_node(&self) -> Option<&NodeTree> {
        Some(self)
    }
}

impl Encode for TypeDescriptor {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Type(self.clone())))
    }
}

impl Encode for DateTime<FixedOffset> {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Timestamp(*self)))
    }
}

impl Encode for bool {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Bool(*self)))
    }
}

macro_rules! encode_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn to_value(&self) -> Option<Cow<'_, Value>> {
                    Some(Cow::Owned(Value::Int(i64::from(*self))))
                }
            }
        )*
    };
}

encode_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! encode_wide_uint {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn to_value(&self) -> Option<Cow<'_, Value>> {
                    let value = match i64::try_from(*self) {
                        Ok(n) => Value::Int(n),
                        Err(_) => Value::Float(*self as f64),
                    };
                    Some(Cow::Owned(value))
                }
            }
        )*
    };
}

encode_wide_uint!(u64, usize);

impl Encode for f32 {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Float(f64::from(*self))))
    }
}

impl Encode for f64 {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::Float(*self)))
    }
}

impl Encode for String {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::String(self.clone())))
    }
}

impl Encode for str {
    fn to_value(&self) -> Option<Cow<'_, Value>> {
        Some(Cow::Owned(Value::String(self.to_string())))
    }
}

impl<T: Encode> Encode for Option<T> {
    fn as_marshaler(&self) -> Option<&dyn Marshaler> {
        self.as_ref().and_then(Encode::as_marshaler)
    }

    fn as_node(&self) -> Option<&NodeTree> {
        self.as_ref().and_then(Encode::as_node)
    }

    fn to_value(&self) -> Option<Cow<'_, Value>> {
        match self {
            None => Some(Cow::Owned(Value::Null)),
            Some(inner) => inner.to_value(),
        }
    }

    fn elements(&self) -> Option<Vec<&dyn Encode>> {
        self.as_ref().and_then(Encode::elements)
    }

    fn as_fields(&self) -> Option<&dyn FieldEnumerable> {
        self.as_ref().and_then(Encode::as_fields)
    }

    fn type_name(&self) -> &'static str {
        match self {
            None => std::any::type_name::<Self>(),
            Some(inner) => inner.type_name(),
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn elements(&self) -> Option<Vec<&dyn Encode>> {
        self.as_slice().elements()
    }
}

impl<T: Encode> Encode for [T] {
    fn elements(&self) -> Option<Vec<&dyn Encode>> {
        Some(self.iter().map(|item| item as &dyn Encode).collect())
    }
}

macro_rules! encode_delegate {
    ($($ptr:ty),*) => {
        $(
            impl<T: Encode + ?Sized> Encode for $ptr {
                fn as_marshaler(&self) -> Option<&dyn Marshaler> {
                    (**self).as_marshaler()
                }

                fn as_node(&self) -> Option<&NodeTree> {
                    (**self).as_node()
                }

                fn to_value(&self) -> Option<Cow<'_, Value>> {
                    (**self).to_value()
                }

                fn elements(&self) -> Option<Vec<&dyn Encode>> {
                    (**self).elements()
                }

                fn as_fields(&self) -> Option<&dyn FieldEnumerable> {
                    (**self).as_fields()
                }

                fn type_name(&self) -> &'static str {
                    (**self).type_name()
                }
            }
        )*
    };
}

encode_delegate!(Box<T>, &T);

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;
    impl Encode for Opaque {}

    #[test]
    fn test_option_delegates() {
        let none: Option<i32> = None;
        assert_eq!(none.to_value().as_deref(), Some(&Value::Null));
        assert_eq!(Some(4).to_value().as_deref(), Some(&Value::Int(4)));
    }

    #[test]
    fn test_wide_unsigned_falls_back_to_float() {
        assert_eq!(7u64.to_value().as_deref(), Some(&Value::Int(7)));
        assert_eq!(u64::MAX.to_value().as_deref(), Some(&Value::Float(u64::MAX as f64)));
    }

    #[test]
    fn test_vec_elements() {
        let v = vec!["a".to_string(), "b".to_string()];
        assert_eq!(v.elements().map(|e| e.len()), Some(2));
        assert!(v.to_value().is_none());
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&0i64));
        assert!(is_empty_value(&String::new()));
        assert!(is_empty_value(&Vec::<i64>::new()));
        assert!(is_empty_value(&Option::<String>::None));
        assert!(!is_empty_value(&"x"));
        assert!(!is_empty_value(&Opaque));
        assert!(is_empty_value(&NodeTree::new()));
    }

    #[test]
    fn test_type_name_through_pointers() {
        let boxed: Box<dyn Encode> = Box::new(Opaque);
        assert!(boxed.type_name().ends_with("Opaque"));
        assert!((&Opaque).type_name().ends_with("Opaque"));
    }

    #[test]
    fn test_field_builder() {
        let n = 3i64;
        let field = Field::new("count", &n).omit_empty();
        assert_eq!(field.name(), "count");
        assert!(field.is_omit_empty());
        assert_eq!(field.value().to_value().as_deref(), Some(&Value::Int(3)));
    }
}
