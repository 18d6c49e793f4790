//! Defines the building blocks for defining schemas: [`Field`], [`DataType`]
//! and [`Repetition`]

use crate::physical::PhysicalType;
use std::fmt::{self, Formatter, Write};

/// Name of the repeated group between a list and its element.
pub const LIST_REPEATED_NAME: &str = "list";
/// Name of a list's element field.
pub const LIST_ELEMENT_NAME: &str = "element";
/// Name of the repeated group between a map and its key, value fields.
pub const MAP_REPEATED_NAME: &str = "key_value";
/// Name of a map's key field.
pub const MAP_KEY_NAME: &str = "key";
/// Name of a map's value field.
pub const MAP_VALUE_NAME: &str = "value";

/// How many times a schema node may occur within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    /// Exactly once
    Required,
    /// Zero or one times
    Optional,
    /// Zero or more times
    Repeated,
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Repetition::Required => write!(f, "required"),
            Repetition::Optional => write!(f, "optional"),
            Repetition::Repeated => write!(f, "repeated"),
        }
    }
}

/// Represents the primitive, nested and repeated types of the data model
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
    /// String type (UTF-8)
    String,
    /// Opaque bytes
    Binary,
    /// A list of elements described by the element field. Stored with the
    /// three level list encoding: list group, repeated group, element.
    List(Box<Field>),
    /// A map stored as a repeated group of key, value fields.
    Map(Box<Field>, Box<Field>),
    /// A nested structure (group/record) containing named fields.
    Struct(Vec<Field>),
}

impl DataType {
    /// Checks if data type is a [`DataType::List`] or [`DataType::Map`]
    pub fn is_repeated(&self) -> bool {
        matches!(self, DataType::List(_) | DataType::Map(_, _))
    }

    /// Checks if data type is stored in a single leaf column
    pub fn is_primitive(&self) -> bool {
        self.physical_type().is_some()
    }

    /// Returns the physical type of a primitive data type.
    pub fn physical_type(&self) -> Option<PhysicalType> {
        match self {
            DataType::Boolean => Some(PhysicalType::Boolean),
            DataType::Int32 => Some(PhysicalType::Int32),
            DataType::Int64 => Some(PhysicalType::Int64),
            DataType::Float => Some(PhysicalType::Float),
            DataType::Double => Some(PhysicalType::Double),
            DataType::String | DataType::Binary => Some(PhysicalType::ByteArray),
            DataType::List(_) | DataType::Map(_, _) | DataType::Struct(_) => None,
        }
    }

    /// Returns a string label representing the variant of this [`DataType`].
    pub fn type_label(&self) -> String {
        let label = match self {
            DataType::Boolean => "Boolean",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::String => "String",
            DataType::Binary => "Binary",
            DataType::List(_) => "List", // does not include element type
            DataType::Map(_, _) => "Map",
            DataType::Struct(_) => "Struct", // does not include fields
        };

        label.into()
    }
}

/// Represents a named schema element, its data type and if the field is
/// optional.
///
/// For lists and maps the flag applies to the outer group: an optional list
/// may be null, a required list may only be empty or non-empty.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Field {
    /// Creates a field definition.
    ///
    /// # Parameters
    /// * `name` - Name of the field.
    /// * `data_type` - The [`DataType`] of the field.
    /// * `nullable` - `true` if the field is optional.
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the [`DataType`] of the field.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Checks if a field is optional.
    pub fn is_optional(&self) -> bool {
        self.nullable
    }

    /// Returns the [`Repetition`] of the node this field is stored as.
    pub fn repetition(&self) -> Repetition {
        if self.nullable {
            Repetition::Optional
        } else {
            Repetition::Required
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.repetition(), self.data_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DataType::List(element) => write!(f, "List [ {element} ]"),
            DataType::Map(key, value) => write!(f, "Map [ {key}, {value} ]"),
            DataType::Struct(fields) => {
                writeln!(f, "Struct {{")?;
                let mut buf = String::new();
                for field in fields.iter() {
                    writeln!(buf, "  {field},")?;
                }
                writeln!(
                    f,
                    "{}",
                    buf.lines()
                        .map(|line| format!(" {line}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )?;
                write!(f, "}}")
            }
            primitive => write!(f, "{}", primitive.type_label()),
        }
    }
}
