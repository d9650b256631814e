//! Caster
//!
//! Turns raw captured text into typed [`Value`]s without the caller knowing in
//! advance which literal grammar matched.
//!
//! A string is tried against each typed parser in a fixed order, and the first one
//! that accepts it wins:
//!
//! ```text
//! "true" / "false"  →  Bool      (any letter case)
//! "none"            →  Null      (any letter case)
//! "-12"             →  Int       (base 10, optional sign)
//! "1.5e3", "1.5D3"  →  Float     (E and Fortran D exponents)
//! anything else     →  Str       (unchanged)
//! ```
//!
//! Surrounding whitespace is ignored by every parser but kept in a `Str` fallback.
//! Integers too large for `i64` fall through to the float parser.
//!
//! Containers are cast element by element and keep their shape: a `Vec<Vec<&str>>`
//! becomes a `Value::Seq` of `Value::Seq`s. Casting never fails, and casting a
//! [`Value`] again returns it unchanged.

use std::fmt;

use serde::Serialize;

use super::find::{self, Capture};

/// A typed capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Seq(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Seq(values.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// CASTING
// ============================================================================

/// Anything that can be interpreted as a [`Value`].
pub trait Cast {
    fn cast(&self) -> Value;
}

/// Cast `value`; shorthand for [`Cast::cast`].
pub fn cast<T: Cast + ?Sized>(value: &T) -> Value {
    value.cast()
}

impl Cast for str {
    fn cast(&self) -> Value {
        let text = self.trim();
        if text.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if text.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else if text.eq_ignore_ascii_case("none") {
            Value::Null
        } else if let Ok(i) = text.parse::<i64>() {
            Value::Int(i)
        } else if let Some(x) = parse_float(text) {
            Value::Float(x)
        } else {
            Value::Str(self.to_string())
        }
    }
}

impl Cast for String {
    fn cast(&self) -> Value {
        self.as_str().cast()
    }
}

impl<T: Cast + ?Sized> Cast for &T {
    fn cast(&self) -> Value {
        (**self).cast()
    }
}

impl<T: Cast> Cast for Option<T> {
    fn cast(&self) -> Value {
        match self {
            Some(value) => value.cast(),
            None => Value::Null,
        }
    }
}

impl<T: Cast> Cast for [T] {
    fn cast(&self) -> Value {
        Value::Seq(self.iter().map(Cast::cast).collect())
    }
}

impl<T: Cast> Cast for Vec<T> {
    fn cast(&self) -> Value {
        self.as_slice().cast()
    }
}

impl Cast for Capture {
    fn cast(&self) -> Value {
        match self {
            Capture::Single(s) => s.cast(),
            Capture::Group(values) => values.cast(),
        }
    }
}

impl Cast for Value {
    fn cast(&self) -> Value {
        match self {
            Value::Str(s) => s.cast(),
            Value::Seq(values) => values.cast(),
            other => other.clone(),
        }
    }
}

/// Rust's float grammar, plus the Fortran `D` exponent.
fn parse_float(text: &str) -> Option<f64> {
    if let Ok(x) = text.parse::<f64>() {
        return Some(x);
    }
    if find::is_number(text) {
        return text.replace(['d', 'D'], "e").parse().ok();
    }
    None
}
