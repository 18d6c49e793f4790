//! The logical values written to and read from a single leaf column.

/// A value at some nesting depth of one leaf column.
///
/// A column only ever sees the slice of a record along its own path, so a
/// struct has exactly one child here: the member on the path to the leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalValue<T> {
    /// Absent at this nesting depth.
    Null,
    /// A leaf value.
    Scalar(T),
    /// A list which may be empty.
    List(Vec<LogicalValue<T>>),
    /// A present struct, holding the member on the path to the leaf.
    Struct(Box<LogicalValue<T>>),
}

impl<T> LogicalValue<T> {
    pub fn scalar(value: T) -> Self {
        LogicalValue::Scalar(value)
    }

    pub fn list(items: impl IntoIterator<Item = LogicalValue<T>>) -> Self {
        LogicalValue::List(items.into_iter().collect())
    }

    pub fn nested(child: LogicalValue<T>) -> Self {
        LogicalValue::Struct(Box::new(child))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LogicalValue::Null)
    }

    /// Returns the scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&T> {
        match self {
            LogicalValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a short label of the variant used in error messages.
    pub fn variant_label(&self) -> &'static str {
        match self {
            LogicalValue::Null => "null",
            LogicalValue::Scalar(_) => "scalar",
            LogicalValue::List(_) => "list",
            LogicalValue::Struct(_) => "struct",
        }
    }
}

impl<T> From<Option<T>> for LogicalValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(LogicalValue::Null, LogicalValue::Scalar)
    }
}

impl<T> From<Vec<LogicalValue<T>>> for LogicalValue<T> {
    fn from(items: Vec<LogicalValue<T>>) -> Self {
        LogicalValue::List(items)
    }
}
