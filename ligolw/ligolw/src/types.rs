use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// The `Type` attribute of a `Column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Lstring,
    String,
    CharS,
    CharV,
    IlwdChar,
    IlwdCharU,
    Blob,
    Int2s,
    Int4s,
    Int8s,
    Int2u,
    Int4u,
    Int8u,
    Int,
    Real4,
    Real8,
    Float,
    Double,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Lstring => "lstring",
            ColumnType::String => "string",
            ColumnType::CharS => "char_s",
            ColumnType::CharV => "char_v",
            ColumnType::IlwdChar => "ilwd:char",
            ColumnType::IlwdCharU => "ilwd:char_u",
            ColumnType::Blob => "blob",
            ColumnType::Int2s => "int_2s",
            ColumnType::Int4s => "int_4s",
            ColumnType::Int8s => "int_8s",
            ColumnType::Int2u => "int_2u",
            ColumnType::Int4u => "int_4u",
            ColumnType::Int8u => "int_8u",
            ColumnType::Int => "int",
            ColumnType::Real4 => "real_4",
            ColumnType::Real8 => "real_8",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Int2s
                | ColumnType::Int4s
                | ColumnType::Int8s
                | ColumnType::Int2u
                | ColumnType::Int4u
                | ColumnType::Int8u
                | ColumnType::Int
        )
    }

    pub fn is_real(&self) -> bool {
        matches!(
            self,
            ColumnType::Real4 | ColumnType::Real8 | ColumnType::Float | ColumnType::Double
        )
    }

    pub fn is_ilwd(&self) -> bool {
        matches!(self, ColumnType::IlwdChar | ColumnType::IlwdCharU)
    }

    /// Decode one stream token. `None` is the null (empty) token.
    pub fn parse_token(&self, token: Option<&str>) -> Result<Value> {
        let Some(token) = token else {
            return Ok(Value::Null);
        };
        let parse_err = || Error::ParseValue {
            token: token.to_string(),
            column_type: self.as_str().to_string(),
        };
        if self.is_integer() {
            token.trim().parse().map(Value::Int).map_err(|_| parse_err())
        } else if self.is_real() {
            token.trim().parse().map(Value::Real).map_err(|_| parse_err())
        } else if self.is_ilwd() {
            Ok(Value::Ilwd(token.to_string()))
        } else {
            Ok(Value::Text(token.to_string()))
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let t = match s {
            "lstring" => ColumnType::Lstring,
            "string" => ColumnType::String,
            "char_s" => ColumnType::CharS,
            "char_v" => ColumnType::CharV,
            "ilwd:char" => ColumnType::IlwdChar,
            "ilwd:char_u" => ColumnType::IlwdCharU,
            "blob" => ColumnType::Blob,
            "int_2s" => ColumnType::Int2s,
            "int_4s" => ColumnType::Int4s,
            "int_8s" => ColumnType::Int8s,
            "int_2u" => ColumnType::Int2u,
            "int_4u" => ColumnType::Int4u,
            "int_8u" => ColumnType::Int8u,
            "int" => ColumnType::Int,
            "real_4" => ColumnType::Real4,
            "real_8" => ColumnType::Real8,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            other => return Err(Error::UnknownColumnType(other.to_string())),
        };
        Ok(t)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    /// An `ilwd:char` row identifier such as `segment:segment_id:12`.
    Ilwd(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Ilwd(s) => Some(s),
            _ => None,
        }
    }

    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => f.write_str(&format_real(*r)),
            Value::Text(s) | Value::Ilwd(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip text for a float, switching to exponent notation for
/// very large or very small magnitudes.
pub(crate) fn format_real(r: f64) -> String {
    let mag = r.abs();
    if r == 0.0 || !r.is_finite() || (1e-5..1e16).contains(&mag) {
        format!("{r}")
    } else {
        format!("{r:e}")
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map(Value::Int).unwrap_or(Value::Null)
    }
}
