//! # Parameter Types
//!
//! [`Type`] is the narrow type language used to describe parameters. Each
//! type answers one question, [`Type::is_instance`], and has a canonical
//! string form (its `Display`) that [`parse`](crate::parse) accepts back.
//!
//! | Canonical form | Instances |
//! |---|---|
//! | `any` | every value |
//! | `string`, `string[1]`, `string[1,64]` | strings within the length bounds |
//! | `int`, `float`, `bool`, `binary`, `timestamp`, `type`, `null` | values of that kind |
//! | `1..999`, `..0`, `0.5..1.5` | numbers within the inclusive range |
//! | `22`, `"tcp"`, `true` | that exact value |
//! | `a\|b` | instances of either side |
//! | `[]T`, `[]T[1,4]` | sequences of `T` within the length bounds |
//! | `map[K]V` | mappings with `K` keys and `V` values |
//! | `{a: T, b?: U, ...}` | struct maps, see [`StructMap`] |
//! | `{T, U}` | tuples |

use std::any::Any;
use std::fmt;

use tyaml_core::resolve::format_float;
use tyaml_core::writer::double_quote;
use tyaml_core::{TypeHandle, Value};

use crate::structmap::StructMap;

/// A parameter type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Any value.
    Any,
    /// A string whose length in characters is within bounds.
    String {
        /// Minimum length.
        min: usize,
        /// Maximum length, unbounded when `None`.
        max: Option<usize>,
    },
    /// Any integer.
    Int,
    /// Any float.
    Float,
    /// A boolean.
    Bool,
    /// Binary data.
    Binary,
    /// A timestamp.
    Timestamp,
    /// A type descriptor.
    Type,
    /// Null.
    Null,
    /// An integer in an inclusive range; a missing end is open.
    IntRange {
        /// Lower bound.
        min: Option<i64>,
        /// Upper bound.
        max: Option<i64>,
    },
    /// A float in an inclusive range; a missing end is open.
    FloatRange {
        /// Lower bound.
        min: Option<f64>,
        /// Upper bound.
        max: Option<f64>,
    },
    /// Exactly this scalar value.
    Exact(Value),
    /// Instances of any member.
    Union(Vec<Type>),
    /// A sequence of `element`, its length within bounds.
    Sequence {
        /// Element type.
        element: Box<Type>,
        /// Minimum length.
        min: usize,
        /// Maximum length, unbounded when `None`.
        max: Option<usize>,
    },
    /// A mapping whose keys and values all have the given types.
    Map {
        /// Key type.
        key: Box<Type>,
        /// Value type.
        value: Box<Type>,
    },
    /// A struct map.
    Struct(StructMap),
    /// A sequence with one type per position.
    Tuple(Vec<Type>),
}

impl Type {
    /// A string of at least `min` characters.
    pub fn string_min(min: usize) -> Self {
        Type::String { min, max: None }
    }

    /// An inclusive integer range.
    pub fn int_range(min: i64, max: i64) -> Self {
        Type::IntRange {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn is_instance(&self, value: &Value) -> bool {
        match (self, value) {
            (Type::Any, _) => true,
            (Type::String { min, max }, Value::String(s)) => within(s.chars().count(), *min, *max),
            (Type::Int, Value::Int(_))
            | (Type::Float, Value::Float(_))
            | (Type::Bool, Value::Bool(_))
            | (Type::Binary, Value::Binary(_))
            | (Type::Timestamp, Value::Timestamp(_))
            | (Type::Type, Value::Type(_))
            | (Type::Null, Value::Null) => true,
            (Type::IntRange { min, max }, Value::Int(i)) => {
                min.map_or(true, |lo| *i >= lo) && max.map_or(true, |hi| *i <= hi)
            }
            (Type::FloatRange { min, max }, Value::Float(f)) => {
                min.map_or(true, |lo| *f >= lo) && max.map_or(true, |hi| *f <= hi)
            }
            (Type::Exact(expected), v) => expected == v,
            (Type::Union(members), v) => members.iter().any(|t| t.is_instance(v)),
            (Type::Sequence { element, min, max }, Value::Sequence(items)) => {
                within(items.len(), *min, *max) && items.iter().all(|item| element.is_instance(item))
            }
            (Type::Map { key, value }, Value::Mapping(mapping)) => mapping
                .iter()
                .all(|(k, v)| key.is_instance(k) && value.is_instance(v)),
            (Type::Struct(structure), v) => structure.is_instance(v),
            (Type::Tuple(types), Value::Sequence(items)) => {
                types.len() == items.len() && types.iter().zip(items).all(|(t, v)| t.is_instance(v))
            }
            _ => false,
        }
    }

    /// Whether a following `[min,max]` would be read as part of this type.
    fn absorbs_bounds(&self) -> bool {
        match self {
            Type::String { min: 0, max: None } => true,
            Type::Sequence { min: 0, max: None, .. } => true,
            Type::Map { value, .. } => value.absorbs_bounds(),
            _ => false,
        }
    }
}

fn within(len: usize, min: usize, max: Option<usize>) -> bool {
    len >= min && max.map_or(true, |max| len <= max)
}

fn write_bounds(f: &mut fmt::Formatter<'_>, min: usize, max: Option<usize>) -> fmt::Result {
    match max {
        Some(max) => write!(f, "[{min},{max}]"),
        None if min > 0 => write!(f, "[{min}]"),
        None => Ok(()),
    }
}

/// Writes `t`, in parentheses when it is a union.
fn write_operand(f: &mut fmt::Formatter<'_>, t: &Type) -> fmt::Result {
    match t {
        Type::Union(_) => write!(f, "({t})"),
        _ => write!(f, "{t}"),
    }
}

pub(crate) fn write_exact(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(&double_quote(s)),
        Value::Float(x) => f.write_str(&format_float(*x)),
        other => write!(f, "{other}"),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::String { min, max } => {
                f.write_str("string")?;
                write_bounds(f, *min, *max)
            }
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Bool => f.write_str("bool"),
            Type::Binary => f.write_str("binary"),
            Type::Timestamp => f.write_str("timestamp"),
            Type::Type => f.write_str("type"),
            Type::Null => f.write_str("null"),
            Type::IntRange { min, max } => {
                if let Some(min) = min {
                    write!(f, "{min}")?;
                }
                f.write_str("..")?;
                if let Some(max) = max {
                    write!(f, "{max}")?;
                }
                Ok(())
            }
            Type::FloatRange { min, max } => {
                if let Some(min) = min {
                    f.write_str(&format_float(*min))?;
                }
                f.write_str("..")?;
                if let Some(max) = max {
                    f.write_str(&format_float(*max))?;
                }
                Ok(())
            }
            Type::Exact(value) => write_exact(f, value),
            Type::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write_operand(f, member)?;
                }
                Ok(())
            }
            Type::Sequence { element, min, max } => {
                f.write_str("[]")?;
                let bounded = *min > 0 || max.is_some();
                if bounded && element.absorbs_bounds() {
                    write!(f, "({element})")?;
                } else {
                    write_operand(f, element)?;
                }
                write_bounds(f, *min, *max)
            }
            Type::Map { key, value } => {
                write!(f, "map[{key}]")?;
                write_operand(f, value)
            }
            Type::Struct(structure) => write!(f, "{structure}"),
            Type::Tuple(types) => {
                f.write_str("{")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl TypeHandle for Type {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
