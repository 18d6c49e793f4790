use crate::error::Result;
use crate::field::{
    DataType, Field, Repetition, LIST_ELEMENT_NAME, MAP_KEY_NAME, MAP_VALUE_NAME,
};
use crate::levels::LevelPath;
use crate::physical::PhysicalType;
use crate::schema_iter::SchemaLeafIterator;
use crate::schema_path::ColumnPath;
use std::fmt;
use std::fmt::Formatter;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Iterates over the leaf columns of this schema in depth-first order.
    pub fn leaves(&self) -> SchemaLeafIterator<'_> {
        SchemaLeafIterator::new(self)
    }

    /// Returns the descriptors of every leaf column in depth-first order.
    pub fn columns(&self) -> Result<Vec<ColumnDescriptor>> {
        self.leaves().collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();

        writeln!(&mut buf, "{} {{", self.name)?;
        for field in &self.fields {
            writeln!(&mut buf, "{}", field)?;
        }
        writeln!(&mut buf, "}}")?;

        write!(f, "{}", buf)
    }
}

#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Schema {
        Schema::new(self.name, self.fields)
    }
}

/// The role of a schema node on the path from the root to a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A plain group (struct), or the repeated group of a list or map.
    Group,
    /// The outer group of a list.
    List,
    /// The outer group of a map.
    Map,
    /// The leaf column itself.
    Primitive,
}

/// One schema node on the path from the root to a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaFrame {
    repetition: Repetition,
    kind: FrameKind,
}

impl SchemaFrame {
    pub fn new(repetition: Repetition, kind: FrameKind) -> Self {
        Self { repetition, kind }
    }

    pub fn group(repetition: Repetition) -> Self {
        Self::new(repetition, FrameKind::Group)
    }

    pub fn list(repetition: Repetition) -> Self {
        Self::new(repetition, FrameKind::List)
    }

    pub fn map(repetition: Repetition) -> Self {
        Self::new(repetition, FrameKind::Map)
    }

    /// The repeated group directly below a list or map.
    pub fn repeated_group() -> Self {
        Self::new(Repetition::Repeated, FrameKind::Group)
    }

    pub fn primitive(repetition: Repetition) -> Self {
        Self::new(repetition, FrameKind::Primitive)
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Checks if this frame is a plain, non-repeated struct group.
    pub fn is_group_boundary(&self) -> bool {
        self.kind == FrameKind::Group && self.repetition != Repetition::Repeated
    }

    /// Checks if this frame is the outer group of a list or map.
    pub fn is_list_like(&self) -> bool {
        matches!(self.kind, FrameKind::List | FrameKind::Map)
    }
}

impl fmt::Display for SchemaFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FrameKind::Group => "group",
            FrameKind::List => "list group",
            FrameKind::Map => "map group",
            FrameKind::Primitive => "primitive",
        };
        write!(f, "{} {}", self.repetition, kind)
    }
}

/// Describes one leaf column: its path, the root-to-leaf schema frames and
/// the levels they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    path: ColumnPath,
    frames: Vec<SchemaFrame>,
    physical_type: PhysicalType,
    levels: LevelPath,
}

impl ColumnDescriptor {
    pub fn new(
        path: ColumnPath,
        frames: Vec<SchemaFrame>,
        physical_type: PhysicalType,
    ) -> Result<Self> {
        let levels = LevelPath::new(&path, &frames)?;
        Ok(Self {
            path,
            frames,
            physical_type,
            levels,
        })
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn frames(&self) -> &[SchemaFrame] {
        &self.frames
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    pub fn levels(&self) -> &LevelPath {
        &self.levels
    }

    pub fn max_definition_level(&self) -> i16 {
        self.levels.max_definition_level()
    }

    pub fn max_repetition_level(&self) -> i16 {
        self.levels.max_repetition_level()
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (max def: {}, max rep: {})",
            self.path,
            self.physical_type,
            self.max_definition_level(),
            self.max_repetition_level()
        )
    }
}

pub fn bool(name: &str) -> Field {
    Field::new(name, DataType::Boolean, false)
}

pub fn int32(name: &str) -> Field {
    Field::new(name, DataType::Int32, false)
}

pub fn integer(name: &str) -> Field {
    Field::new(name, DataType::Int64, false)
}

pub fn double(name: &str) -> Field {
    Field::new(name, DataType::Double, false)
}

pub fn string(name: &str) -> Field {
    Field::new(name, DataType::String, false)
}

pub fn binary(name: &str) -> Field {
    Field::new(name, DataType::Binary, false)
}

pub fn optional_bool(name: &str) -> Field {
    Field::new(name, DataType::Boolean, true)
}

pub fn optional_int32(name: &str) -> Field {
    Field::new(name, DataType::Int32, true)
}

pub fn optional_integer(name: &str) -> Field {
    Field::new(name, DataType::Int64, true)
}

pub fn optional_double(name: &str) -> Field {
    Field::new(name, DataType::Double, true)
}

pub fn optional_string(name: &str) -> Field {
    Field::new(name, DataType::String, true)
}

pub fn optional_binary(name: &str) -> Field {
    Field::new(name, DataType::Binary, true)
}

/// Creates the element field of a list.
pub fn element(data_type: DataType, nullable: bool) -> Field {
    Field::new(LIST_ELEMENT_NAME, data_type, nullable)
}

/// A list which may be empty but never null.
pub fn list(name: &str, element: Field) -> Field {
    Field::new(name, DataType::List(Box::new(element)), false)
}

/// A list which may be null, empty or non-empty.
pub fn optional_list(name: &str, element: Field) -> Field {
    Field::new(name, DataType::List(Box::new(element)), true)
}

fn map_type(key: DataType, value: DataType, value_nullable: bool) -> DataType {
    DataType::Map(
        Box::new(Field::new(MAP_KEY_NAME, key, false)),
        Box::new(Field::new(MAP_VALUE_NAME, value, value_nullable)),
    )
}

/// A map which may be empty but never null. Keys are always required.
pub fn map(name: &str, key: DataType, value: DataType, value_nullable: bool) -> Field {
    Field::new(name, map_type(key, value, value_nullable), false)
}

/// A map which may be null, empty or non-empty. Keys are always required.
pub fn optional_map(name: &str, key: DataType, value: DataType, value_nullable: bool) -> Field {
    Field::new(name, map_type(key, value, value_nullable), true)
}

/// A repeated primitive in the Dremel sense: zero or more required values.
pub fn repeated_bool(name: &str) -> Field {
    list(name, element(DataType::Boolean, false))
}

pub fn repeated_integer(name: &str) -> Field {
    list(name, element(DataType::Int64, false))
}

pub fn repeated_string(name: &str) -> Field {
    list(name, element(DataType::String, false))
}

pub fn required_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, DataType::Struct(fields), false)
}

pub fn optional_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, DataType::Struct(fields), true)
}

/// A repeated group in the Dremel sense: zero or more required structs.
pub fn repeated_group(name: &str, fields: Vec<Field>) -> Field {
    list(name, element(DataType::Struct(fields), false))
}
