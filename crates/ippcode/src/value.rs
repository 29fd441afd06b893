//! Runtime value model.
//!
//! IPPcode22 is dynamically typed: every runtime value carries its type as a
//! tag. [`Value`] is the tagged union the whole engine operates on; the extra
//! [`Value::Unset`] variant marks a declared-but-undefined variable slot and
//! is rejected by every handler that actually needs a value.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// A runtime value, or the distinguished unset slot state.
///
/// Strings are sequences of Unicode scalar values; all indexing operations
/// (`STRLEN`, `GETCHAR`, `SETCHAR`, `STRI2INT`) count code points, never
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Unicode string; escape triples were already decoded at load time.
    Str(String),
    /// Boolean.
    Bool(bool),
    /// The sole inhabitant of the nil type.
    Nil,
    /// Declared but not yet assigned. Distinct from [`Value::Nil`].
    Unset,
}

/// Name of one of the four value types, as written in source type tags and
/// produced by the `TYPE` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    Int,
    String,
    Bool,
    Nil,
}

impl Value {
    /// The type of this value, or `None` for an unset slot.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Int(_) => Some(DataType::Int),
            Self::Str(_) => Some(DataType::String),
            Self::Bool(_) => Some(DataType::Bool),
            Self::Nil => Some(DataType::Nil),
            Self::Unset => None,
        }
    }

    /// The type name as written by `TYPE`: one of `int`, `string`, `bool`,
    /// `nil`, or the empty string for an unset slot.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.data_type() {
            Some(data_type) => data_type.into(),
            None => "",
        }
    }

    /// Whether this slot holds an actual value.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

/// `WRITE` output form: ints in decimal, bools lowercase, strings verbatim,
/// nil as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(true) => f.write_str("true"),
            Self::Bool(false) => f.write_str("false"),
            Self::Nil | Self::Unset => Ok(()),
        }
    }
}
