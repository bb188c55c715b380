//! Dynamically typed argument values.
//!
//! Converters turn tokens into [`Value`]s; handlers receive them back as
//! concrete Rust types through [`FromValue`]. Application types travel as
//! [`Value::Custom`] and are recovered with `Arc<T>` parameters.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ValueError;

/// A converted argument, flag or context value.
#[derive(Clone)]
pub enum Value {
    /// 32-bit integer (`int`).
    Int(i32),
    /// 64-bit integer (`long`).
    Long(i64),
    /// Floating point number (`double`).
    Double(f64),
    /// Boolean (`boolean`, switch flags).
    Bool(bool),
    /// Text (`string`, variadic arguments).
    String(String),
    /// An application-defined value.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps an application value.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Returns a short label for the variant, used in error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Bool(_) => "boolean",
            Self::String(_) => "string",
            Self::Custom(_) => "custom",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the wrapped application value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// ============================================================================
// FromValue - handler parameter extraction
// ============================================================================

/// Types that can be built from a matched value slot.
///
/// A slot is `None` when an optional argument was omitted and declared no
/// default. Wrap the parameter in `Option<T>` to accept that case.
pub trait FromValue: Sized {
    /// Builds `Self` from one slot of the matched value list.
    fn from_value(value: Option<Value>) -> Result<Self, ValueError>;
}

fn mismatch<T>(expected: &'static str, got: &Value) -> Result<T, ValueError> {
    Err(ValueError::Mismatch {
        expected,
        got: got.type_label(),
    })
}

impl FromValue for Value {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        value.ok_or(ValueError::Missing)
    }
}

impl FromValue for i32 {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        let value = value.ok_or(ValueError::Missing)?;
        value.as_int().map_or_else(|| mismatch("int", &value), Ok)
    }
}

impl FromValue for i64 {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        let value = value.ok_or(ValueError::Missing)?;
        value.as_long().map_or_else(|| mismatch("long", &value), Ok)
    }
}

impl FromValue for f64 {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        let value = value.ok_or(ValueError::Missing)?;
        value.as_double().map_or_else(|| mismatch("double", &value), Ok)
    }
}

impl FromValue for bool {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        let value = value.ok_or(ValueError::Missing)?;
        value.as_bool().map_or_else(|| mismatch("boolean", &value), Ok)
    }
}

impl FromValue for String {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        match value {
            Some(Value::String(s)) => Ok(s),
            Some(other) => mismatch("string", &other),
            None => Err(ValueError::Missing),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        match value {
            Some(Value::Custom(inner)) => inner.downcast::<T>().map_err(|_| ValueError::Mismatch {
                expected: std::any::type_name::<T>(),
                got: "custom",
            }),
            Some(other) => mismatch(std::any::type_name::<T>(), &other),
            None => Err(ValueError::Missing),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Option<Value>) -> Result<Self, ValueError> {
        match value {
            Some(v) => T::from_value(Some(v)).map(Some),
            None => Ok(None),
        }
    }
}
