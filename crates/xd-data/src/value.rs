//! Native values stored on nodes.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::base::{Base, ValueKind};
use crate::error::{ErrorKind, XdError};
use crate::string_set::StringSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Unsigned(u64),
    Integer(i64),
    /// Used by both `Real` and `Double`.
    Real(f64),
    Text(String),
    Octets(Vec<u8>),
    Set(StringSet),
    DateTime(DateTime<FixedOffset>),
}

fn format_error(base: Base, text: &str) -> XdError {
    XdError::new(
        ErrorKind::ValueFormat,
        format!("'{text}' is not a valid {base} value"),
    )
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Unsigned(_) => ValueKind::Unsigned,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
            Value::Octets(_) => ValueKind::Octets,
            Value::Set(_) => ValueKind::Set,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Converts untyped text into the native form of `base`.
    pub fn parse(base: Base, text: &str) -> Result<Value, XdError> {
        let kind = base.value_kind().ok_or_else(|| {
            XdError::new(
                ErrorKind::CannotHaveValue,
                format!("Base type {base} does not hold a value"),
            )
        })?;
        let trimmed = text.trim();
        let value = match kind {
            ValueKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Boolean(true),
                "false" | "0" => Value::Boolean(false),
                _ => return Err(format_error(base, text)),
            },
            ValueKind::Unsigned => Value::Unsigned(
                trimmed
                    .parse::<u64>()
                    .map_err(|_| format_error(base, text))?,
            ),
            ValueKind::Integer => Value::Integer(
                trimmed
                    .parse::<i64>()
                    .map_err(|_| format_error(base, text))?,
            ),
            ValueKind::Real => Value::Real(
                trimmed
                    .parse::<f64>()
                    .map_err(|_| format_error(base, text))?,
            ),
            ValueKind::Text => Value::Text(text.to_string()),
            ValueKind::Octets => Value::Octets(parse_hex(trimmed).ok_or_else(|| format_error(base, text))?),
            ValueKind::Set => Value::Set(StringSet::parse(text)),
            ValueKind::DateTime => Value::DateTime(
                DateTime::parse_from_rfc3339(trimmed).map_err(|_| format_error(base, text))?,
            ),
        };
        Ok(value)
    }

    /// Converts this value into the form `base` stores.
    pub fn conform(self, base: Base) -> Result<Value, XdError> {
        let kind = base.value_kind().ok_or_else(|| {
            XdError::new(
                ErrorKind::CannotHaveValue,
                format!("Base type {base} does not hold a value"),
            )
        })?;
        if self.kind() == kind {
            return Ok(self);
        }
        let mismatch = |v: &Value| {
            XdError::new(
                ErrorKind::ValueFormat,
                format!("A {:?} value can't be stored in a {base}", v.kind()),
            )
        };
        match (self, kind) {
            (Value::Text(text), _) => Value::parse(base, &text),
            (v, ValueKind::Text) => Ok(Value::Text(v.to_string())),
            (Value::Integer(i), ValueKind::Unsigned) => u64::try_from(i)
                .map(Value::Unsigned)
                .map_err(|_| XdError::new(ErrorKind::ValueOutOfRange, format!("{i} is negative"))),
            (Value::Unsigned(u), ValueKind::Integer) => i64::try_from(u)
                .map(Value::Integer)
                .map_err(|_| XdError::new(ErrorKind::ValueOutOfRange, format!("{u} is too large"))),
            (Value::Unsigned(u), ValueKind::Real) => Ok(Value::Real(u as f64)),
            (Value::Integer(i), ValueKind::Real) => Ok(Value::Real(i as f64)),
            (Value::Real(r), ValueKind::Unsigned) if r.fract() == 0.0 && r >= 0.0 && r <= u64::MAX as f64 => {
                Ok(Value::Unsigned(r as u64))
            }
            (Value::Real(r), ValueKind::Integer)
                if r.fract() == 0.0 && r >= i64::MIN as f64 && r <= i64::MAX as f64 =>
            {
                Ok(Value::Integer(r as i64))
            }
            (v, _) => Err(mismatch(&v)),
        }
    }

    /// The base that stores this kind of value without conversion.
    pub fn natural_base(&self) -> Base {
        match self {
            Value::Boolean(_) => Base::Boolean,
            Value::Unsigned(_) => Base::Unsigned,
            Value::Integer(_) => Base::Integer,
            Value::Real(_) => Base::Real,
            Value::Text(_) => Base::String,
            Value::Octets(_) => Base::OctetString,
            Value::Set(_) => Base::StringSet,
            Value::DateTime(_) => Base::DateTime,
        }
    }

    /// Truth of a value when used on its own, e.g. a bare path in a filter.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Unsigned(u) => *u != 0,
            Value::Integer(i) => *i != 0,
            Value::Real(r) => *r != 0.0,
            Value::Text(t) => !t.is_empty() && t != "false",
            Value::Octets(o) => !o.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::DateTime(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Unsigned(u) => Some(*u as f64),
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Unsigned(u) => i64::try_from(*u).ok(),
            Value::Integer(i) => Some(*i),
            Value::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Length for min/max length checks: characters for text, bytes for
    /// octets, components for sets.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Text(t) => Some(t.chars().count()),
            Value::Octets(o) => Some(o.len()),
            Value::Set(s) => Some(s.len()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Unsigned(u) => write!(f, "{u}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(t) => f.write_str(t),
            Value::Octets(o) => {
                for byte in o {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            Value::Set(s) => write!(f, "{s}"),
            Value::DateTime(d) => f.write_str(&d.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Unsigned(u)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(t: &str) -> Self {
        Value::Text(t.to_string())
    }
}

impl From<String> for Value {
    fn from(t: String) -> Self {
        Value::Text(t)
    }
}

impl From<StringSet> for Value {
    fn from(s: StringSet) -> Self {
        Value::Set(s)
    }
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| text.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}
