//! Defines the representation of nested record values.

use crate::field::DataType;
use std::fmt;
use std::fmt::Formatter;

/// Represents a concrete instance of a nested record.
///
/// Null is a value of its own which any optional field accepts. A record is
/// a [`Value::Struct`] whose properties name the top-level fields of the
/// schema.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    /// String (UTF-8) value
    String(String),
    /// Opaque bytes
    Binary(Vec<u8>),
    /// Repeated value represented as a list of elements. If there are zero
    /// elements the list is empty, which is distinct from null.
    List(Vec<Value>),
    /// Key, value entries of a map in insertion order.
    Map(Vec<(Value, Value)>),
    /// A nested structure (group/record) containing name, value pairs.
    Struct(Vec<(String, Value)>),
}

impl Value {
    fn fmt_with_indent(&self, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Boolean(value) => write!(f, "Value::Boolean({:?})", value),
            Value::Int32(value) => write!(f, "Value::Int32({:?})", value),
            Value::Int64(value) => write!(f, "Value::Int64({:?})", value),
            Value::Float(value) => write!(f, "Value::Float({:?})", value),
            Value::Double(value) => write!(f, "Value::Double({:?})", value),
            Value::String(value) => write!(f, "Value::String({:?})", value),
            Value::Binary(value) => write!(f, "Value::Binary({} bytes)", value.len()),
            Value::List(values) if values.is_empty() => write!(f, "Value::List(items: [])"),
            Value::List(values) => {
                write!(f, "Value::List(items: [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?
                    }
                    value.fmt_with_indent(f, indent)?;
                }
                write!(f, "])")
            }
            Value::Map(entries) if entries.is_empty() => write!(f, "Value::Map({{}})"),
            Value::Map(entries) => {
                write!(f, "Value::Map({{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?
                    }
                    k.fmt_with_indent(f, indent)?;
                    write!(f, " => ")?;
                    v.fmt_with_indent(f, indent)?;
                }
                write!(f, "}})")
            }
            Value::Struct(fields) if fields.is_empty() => write!(f, "Value::Struct({{}})"),
            Value::Struct(fields) => {
                writeln!(f, "{{")?;
                for (k, v) in fields {
                    write!(f, "{:indent$}", "", indent = indent + 2)?;
                    write!(f, "{}: ", k)?;
                    v.fmt_with_indent(f, indent + 2)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{:indent$}}}", "", indent = indent)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value of a struct property, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(props) => props.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Checks if this value can be stored in a field of `data_type`.
    ///
    /// Only the outermost variant is compared. Null matches every type.
    pub fn matches_type(&self, data_type: &DataType) -> bool {
        matches!(
            (self, data_type),
            (Value::Null, _)
                | (Value::Boolean(_), DataType::Boolean)
                | (Value::Int32(_), DataType::Int32)
                | (Value::Int64(_), DataType::Int64)
                | (Value::Float(_), DataType::Float)
                | (Value::Double(_), DataType::Double)
                | (Value::String(_), DataType::String)
                | (Value::Binary(_), DataType::Binary)
                | (Value::List(_), DataType::List(_))
                | (Value::Map(_), DataType::Map(_, _))
                | (Value::Struct(_), DataType::Struct(_))
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.fmt_with_indent(f, 0)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Ergonomic builder pattern API for creating a concrete nested value.
#[derive(Debug, Default, Clone)]
pub struct ValueBuilder {
    fields: Vec<(String, Value)>,
}

impl ValueBuilder {
    /// Add a name, value pair to the value being built.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Add a name, repeated value to the value being built.
    pub fn repeated(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.fields.push((
            key.into(),
            Value::List(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Add a name, map value to the value being built.
    pub fn map(
        mut self,
        key: impl Into<String>,
        entries: impl IntoIterator<Item = (impl Into<Value>, impl Into<Value>)>,
    ) -> Self {
        self.fields.push((
            key.into(),
            Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        ));
        self
    }

    /// Add a null value
    pub fn null(self, key: impl Into<String>) -> Self {
        self.field(key, Value::Null)
    }

    /// Consumes the builder and returns the constructed [`Value`]
    pub fn build(self) -> Value {
        Value::Struct(self.fields)
    }
}
