//! Content stream operand and operation types.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;

/// Operand value as produced by the content stream tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating point) value
    Real(f64),
    /// String (byte array)
    Str(Vec<u8>),
    /// Name object (e.g., /F1, /Pattern)
    Name(SmolStr),
    /// Array of operands
    Array(Vec<Operand>),
    /// Inline dictionary
    Dict(IndexMap<SmolStr, Operand>),
}

impl Operand {
    /// Returns the type name for error messages and traces.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Real(_) => "real",
            Self::Str(_) => "string",
            Self::Name(_) => "name",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Real(_))
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Operand]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<SmolStr, Operand>> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Self::Name(SmolStr::new(v))
    }
}

/// A single operator with its operands, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: SmolStr,
    pub operands: Vec<Operand>,
}

impl Operation {
    pub fn new(operator: impl Into<SmolStr>, operands: Vec<Operand>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// Shared, immutable operator sequence of a page, form, pattern cell or glyph.
pub type ContentStream = Arc<[Operation]>;
